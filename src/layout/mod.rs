//! Deterministic image-geometry primitives used by the compositor.

pub mod logo;
pub(crate) mod paint;
pub mod safe_zone;
pub mod text;
pub mod wrap;

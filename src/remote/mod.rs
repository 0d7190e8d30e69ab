//! Gemini-backed production implementations of the generator and judge.

pub mod client;
pub mod gemini;
pub mod prompts;

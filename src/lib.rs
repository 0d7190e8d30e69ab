#![forbid(unsafe_code)]
//! Brief-driven ad creative generation.
//!
//! A [`CampaignBrief`] fans out into one unit per (product, aspect ratio). Each unit asks a
//! [`BackgroundGenerator`] for a scene, lays copy and logo over a reserved bottom safe
//! zone with [`compose`], and lets a [`ComplianceJudge`] accept it or send it back for
//! another attempt. Results flow to a [`CreativeSink`] in deterministic order.

pub mod assets;
pub mod brief;
pub mod compose;
pub mod config;
pub mod foundation;
pub mod generate;
pub mod layout;
pub mod pipeline;
pub mod remote;
pub mod review;
pub mod sink;

pub use assets::decode::decode_logo;
pub use assets::font::{FontFace, TextShaper};
pub use assets::source::AssetSource;
pub use brief::context::CampaignContext;
pub use brief::load::{load_brief, normalize_brief};
pub use brief::locale::{choose_message_for_locale, slugify, summarize_brand};
pub use brief::model::{Brand, CampaignBrief, LegalConfig, Product};
pub use compose::{Composite, CompositeLayout, Typography, compose};
pub use config::{AspectRatioSpec, GeminiSettings, RunConfig, default_aspect_ratios};
pub use foundation::cancel::CancelFlag;
pub use foundation::core::{Canvas, Corner, PixelRect, Rgba8, parse_hex_color};
pub use foundation::error::{AdError, AdResult};
pub use generate::{BackgroundGenerator, GenerationRequest, Guidance};
pub use layout::logo::render_logo_card;
pub use layout::safe_zone::reserve_safe_zone;
pub use layout::text::{TextStyle, render_text_overlay};
pub use layout::wrap::{FixedAdvanceMetrics, FontMetrics, WrappedLines, wrap_text};
pub use pipeline::{Orchestrator, RunInfo, RunSummary, UnitSummary};
pub use remote::client::GeminiClient;
pub use remote::gemini::{GeminiImageGenerator, GeminiJudge};
pub use review::controller::{
    AttemptRecord, CreativeRecord, FinalCreative, ReviewAttempt, ReviewLoop, ReviewState,
    UnitJob, UnitStatus,
};
pub use review::judge::{ComplianceJudge, ReviewContext};
pub use review::verdict::{ReviewVerdict, parse_verdict};
pub use sink::{CreativeSink, DirectorySink, InMemorySink};

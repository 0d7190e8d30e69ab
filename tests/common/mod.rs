#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use adcraft::{
    AdError, AdResult, AspectRatioSpec, AssetSource, BackgroundGenerator, Brand, CampaignBrief,
    ComplianceJudge, Composite, FontFace, GenerationRequest, Product, ReviewContext,
    ReviewVerdict, RunConfig, Typography,
};
use image::RgbaImage;

pub fn font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf")
}

pub fn typography() -> Typography {
    Typography::new(FontFace::load(&AssetSource::Path(font_path())).unwrap())
}

pub fn png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn solid_png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    png(&RgbaImage::from_pixel(w, h, image::Rgba(rgba)))
}

pub fn small_config(workers: usize) -> RunConfig {
    RunConfig {
        workers,
        aspect_ratios: vec![
            AspectRatioSpec::new("1x1", 96, 96, 0.25),
            AspectRatioSpec::new("9x16", 72, 128, 0.25),
            AspectRatioSpec::new("16x9", 128, 72, 0.3),
        ],
        ..RunConfig::default()
    }
}

pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        message: format!("{name} for every day"),
        message_localized: Default::default(),
        image_path: None,
    }
}

pub fn brief(products: Vec<Product>, aspects: &[&str]) -> CampaignBrief {
    CampaignBrief {
        campaign_name: "Summer Launch".into(),
        target_region: "EU".into(),
        audience: "commuters".into(),
        brand: Brand::default(),
        products,
        locale: "en_US".into(),
        aspect_ratios: aspects.iter().map(|s| s.to_string()).collect(),
        legal: None,
    }
}

/// Returns a flat 64x64 background and counts calls.
#[derive(Default)]
pub struct FlatGenerator {
    pub calls: AtomicUsize,
    pub guidance: Mutex<Vec<Option<String>>>,
}

impl FlatGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BackgroundGenerator for FlatGenerator {
    fn generate_background(&self, request: &GenerationRequest<'_>) -> AdResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.guidance
            .lock()
            .unwrap()
            .push(request.guidance.map(str::to_string));
        Ok(solid_png(64, 64, [40, 110, 170, 255]))
    }
}

/// Plays back verdicts in order; errors once the script runs out.
pub struct ScriptedJudge(Mutex<Vec<AdResult<ReviewVerdict>>>);

impl ScriptedJudge {
    pub fn new(mut script: Vec<AdResult<ReviewVerdict>>) -> Self {
        script.reverse();
        Self(Mutex::new(script))
    }
}

impl ComplianceJudge for ScriptedJudge {
    fn judge(&self, _: &Composite, _: &ReviewContext<'_>) -> AdResult<ReviewVerdict> {
        self.0
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(AdError::judge("script ran out")))
    }
}

/// Accepts everything except products whose name is listed, which score by attempt.
pub struct PickyJudge {
    pub reject: Vec<String>,
}

impl ComplianceJudge for PickyJudge {
    fn judge(&self, _: &Composite, ctx: &ReviewContext<'_>) -> AdResult<ReviewVerdict> {
        if self.reject.iter().any(|r| r == ctx.product_name) {
            ReviewVerdict::new(true, false, false, 30 + i64::from(ctx.attempt), "off-brand")
        } else {
            ReviewVerdict::new(true, true, true, 88, "looks good")
        }
    }
}

pub fn pass(score: i64) -> AdResult<ReviewVerdict> {
    Ok(ReviewVerdict::new(true, true, true, score, "ok").unwrap())
}

pub fn reject(score: i64, feedback: &str) -> AdResult<ReviewVerdict> {
    Ok(ReviewVerdict::new(false, true, false, score, feedback).unwrap())
}

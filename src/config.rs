use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Corner};
use crate::foundation::error::{AdError, AdResult};

/// Named output format with its canvas and reserved bottom safe zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AspectRatioSpec {
    pub label: String,
    pub canvas: Canvas,
    /// Fraction of the canvas height reserved at the bottom for overlays, in (0, 1).
    #[serde(default = "default_safe_zone_fraction")]
    pub safe_zone_fraction: f32,
}

impl AspectRatioSpec {
    pub fn new(label: impl Into<String>, width: u32, height: u32, fraction: f32) -> Self {
        Self {
            label: label.into(),
            canvas: Canvas { width, height },
            safe_zone_fraction: fraction,
        }
    }

    pub fn validate(&self) -> AdResult<()> {
        if self.label.trim().is_empty() {
            return Err(AdError::validation("aspect ratio label must be non-empty"));
        }
        // Labels name output files.
        if self.label.starts_with('.')
            || !self
                .label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(AdError::validation(format!(
                "aspect ratio label '{}' may only use ASCII letters, digits, '-', '_' and '.', \
                 and must not start with '.'",
                self.label
            )));
        }
        Canvas::new(self.canvas.width, self.canvas.height)?;
        let f = self.safe_zone_fraction;
        if !f.is_finite() || f <= 0.0 || f >= 1.0 {
            return Err(AdError::validation(format!(
                "aspect '{}' safe_zone_fraction must be in (0, 1), got {f}",
                self.label
            )));
        }
        Ok(())
    }
}

fn default_safe_zone_fraction() -> f32 {
    0.25
}

pub fn default_aspect_ratios() -> Vec<AspectRatioSpec> {
    vec![
        AspectRatioSpec::new("1x1", 1080, 1080, 0.25),
        AspectRatioSpec::new("9x16", 1080, 1920, 0.25),
        AspectRatioSpec::new("16x9", 1920, 1080, 0.25),
    ]
}

/// Endpoint settings for the Gemini-backed generator and judge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub base_url: String,
    pub image_model: String,
    pub review_model: String,
    /// Environment variables probed, in order, for the API key.
    pub api_key_env: Vec<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
            review_model: "gemini-2.5-flash-image-preview".to_string(),
            api_key_env: vec!["GEMINI_API_KEY".to_string(), "GOOGLE_API_KEY".to_string()],
        }
    }
}

impl GeminiSettings {
    pub fn resolve_api_key(&self) -> AdResult<String> {
        self.api_key_env
            .iter()
            .find_map(|k| std::env::var(k).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                AdError::account(format!(
                    "none of {} is set",
                    self.api_key_env.join(", ")
                ))
            })
    }
}

/// Run-level knobs. Every field has a default so a config file is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Attempt budget per unit (generate -> compose -> review cycles).
    pub max_attempts: u32,
    /// Worker threads for unit fan-out; 1 runs units sequentially.
    pub workers: usize,
    pub request_timeout_secs: u64,
    pub aspect_ratios: Vec<AspectRatioSpec>,
    pub logo_corner: Corner,
    pub font_path: Option<PathBuf>,
    pub gemini: GeminiSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            workers: 1,
            request_timeout_secs: 120,
            aspect_ratios: default_aspect_ratios(),
            logo_corner: Corner::BottomRight,
            font_path: None,
            gemini: GeminiSettings::default(),
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> AdResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: RunConfig = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| AdError::validation(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AdResult<()> {
        if self.max_attempts == 0 {
            return Err(AdError::validation("max_attempts must be >= 1"));
        }
        if self.workers == 0 {
            return Err(AdError::validation("workers must be >= 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(AdError::validation("request_timeout_secs must be >= 1"));
        }
        if self.aspect_ratios.is_empty() {
            return Err(AdError::validation("at least one aspect ratio is required"));
        }
        let mut labels = HashSet::new();
        for spec in &self.aspect_ratios {
            spec.validate()?;
            if !labels.insert(spec.label.as_str()) {
                return Err(AdError::validation(format!(
                    "duplicate aspect ratio label '{}'",
                    spec.label
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn aspect(&self, label: &str) -> Option<&AspectRatioSpec> {
        self.aspect_ratios.iter().find(|s| s.label == label)
    }
}

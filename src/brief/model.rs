use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assets::source::AssetSource;

/// Shared brand identity for every product of a campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(default = "default_brand_name")]
    pub name: String,
    /// Primary brand color as `#rrggbb`; used for subtle scene accents.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default)]
    pub accent_colors: Vec<String>,
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
    /// Free-form tone of voice ("playful", "premium", ...).
    #[serde(default)]
    pub tone: Option<String>,
}

impl Brand {
    pub fn logo_source(&self) -> Option<AssetSource> {
        self.logo_path.clone().map(AssetSource::Path)
    }
}

impl Default for Brand {
    fn default() -> Self {
        Self {
            name: default_brand_name(),
            primary_color: default_primary_color(),
            accent_colors: Vec::new(),
            logo_path: None,
            tone: None,
        }
    }
}

/// One product that needs a creative per required aspect ratio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stable slug used for output directories and logs.
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Default copy in the base locale.
    pub message: String,
    #[serde(default)]
    pub message_localized: BTreeMap<String, String>,
    /// Reference photo used to keep the generated product recognizable.
    #[serde(default)]
    pub image_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalConfig {
    /// Words or phrases that must not appear anywhere in a creative.
    #[serde(default)]
    pub banned_words: Vec<String>,
}

/// Validated campaign brief; immutable for the duration of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignBrief {
    #[serde(default = "default_campaign_name")]
    pub campaign_name: String,
    #[serde(default = "unknown")]
    pub target_region: String,
    #[serde(default = "unknown")]
    pub audience: String,
    #[serde(default)]
    pub brand: Brand,
    pub products: Vec<Product>,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Required aspect labels in output order. Empty means every configured ratio.
    #[serde(default)]
    pub aspect_ratios: Vec<String>,
    #[serde(default)]
    pub legal: Option<LegalConfig>,
}

impl CampaignBrief {
    pub fn banned_words(&self) -> &[String] {
        self.legal
            .as_ref()
            .map(|l| l.banned_words.as_slice())
            .unwrap_or(&[])
    }
}

fn default_brand_name() -> String {
    "Brand".to_string()
}

fn default_primary_color() -> String {
    "#222222".to_string()
}

fn default_campaign_name() -> String {
    "Campaign".to_string()
}

fn unknown() -> String {
    "Unknown".to_string()
}

pub(crate) fn default_locale() -> String {
    "en_US".to_string()
}

use serde::Serialize;

use crate::brief::model::CampaignBrief;

/// Brief-level facts handed to the remote generator and judge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CampaignContext {
    pub campaign_name: String,
    pub brand_name: String,
    pub primary_color: String,
    pub accent_colors: Vec<String>,
    pub tone: Option<String>,
    pub target_region: String,
    pub audience: String,
    pub locale: String,
    pub banned_words: Vec<String>,
}

impl CampaignContext {
    pub fn from_brief(brief: &CampaignBrief) -> Self {
        Self {
            campaign_name: brief.campaign_name.clone(),
            brand_name: brief.brand.name.clone(),
            primary_color: brief.brand.primary_color.clone(),
            accent_colors: brief.brand.accent_colors.clone(),
            tone: brief.brand.tone.clone(),
            target_region: brief.target_region.clone(),
            audience: brief.audience.clone(),
            locale: brief.locale.clone(),
            banned_words: brief.banned_words().to_vec(),
        }
    }
}

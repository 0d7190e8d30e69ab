use crate::brief::model::{CampaignBrief, Product};
use crate::foundation::core::try_parse_hex_color;

/// Filesystem and id friendly slug: lowercase alphanumerics, separators collapsed to `-`.
///
/// Returns `"item"` when nothing survives.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if matches!(ch, ' ' | '-' | '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick the product copy for `locale`: exact match, then language prefix, then default.
pub fn choose_message_for_locale<'a>(product: &'a Product, locale: &str) -> &'a str {
    if let Some(msg) = product.message_localized.get(locale) {
        return msg;
    }
    let lang = locale.split(['_', '-']).next().unwrap_or(locale);
    if let Some(msg) = product.message_localized.get(lang) {
        return msg;
    }
    &product.message
}

/// Static brand configuration signals, logged once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrandSummary {
    pub logo_present: bool,
    pub brand_color_defined: bool,
}

pub fn summarize_brand(brief: &CampaignBrief) -> BrandSummary {
    BrandSummary {
        logo_present: brief.brand.logo_path.is_some(),
        brand_color_defined: try_parse_hex_color(&brief.brand.primary_color).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn product() -> Product {
        let mut localized = BTreeMap::new();
        localized.insert("fr_CA".to_string(), "Bonjour Canada".to_string());
        localized.insert("de".to_string(), "Hallo".to_string());
        Product {
            id: "p".to_string(),
            name: "P".to_string(),
            message: "Hello".to_string(),
            message_localized: localized,
            image_path: None,
        }
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Smart Speaker_Pro -- X "), "smart-speaker-pro-x");
        assert_eq!(slugify("Eau de Café!"), "eau-de-café");
        assert_eq!(slugify("***"), "item");
    }

    #[test]
    fn locale_falls_back_to_language_then_default() {
        let p = product();
        assert_eq!(choose_message_for_locale(&p, "fr_CA"), "Bonjour Canada");
        assert_eq!(choose_message_for_locale(&p, "de_AT"), "Hallo");
        assert_eq!(choose_message_for_locale(&p, "ja_JP"), "Hello");
    }
}

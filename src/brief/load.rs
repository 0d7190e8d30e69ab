use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::brief::locale::slugify;
use crate::brief::model::CampaignBrief;
use crate::config::AspectRatioSpec;
use crate::foundation::error::{AdError, AdResult};

/// Load a JSON brief, resolve relative asset paths against its directory, and validate it.
pub fn load_brief(path: &Path, aspect_table: &[AspectRatioSpec]) -> AdResult<CampaignBrief> {
    let f = File::open(path).with_context(|| format!("open brief '{}'", path.display()))?;
    let mut brief: CampaignBrief = serde_json::from_reader(BufReader::new(f))
        .map_err(|e| AdError::validation(format!("parse brief '{}': {e}", path.display())))?;

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_paths(&mut brief, root);
    normalize_brief(&mut brief, aspect_table)?;
    Ok(brief)
}

/// Fill defaults and enforce the structural rules the core relies on.
///
/// After this returns, every product has a unique non-empty id and the aspect list names
/// only labels present in `aspect_table`, in the order the brief listed them.
pub fn normalize_brief(
    brief: &mut CampaignBrief,
    aspect_table: &[AspectRatioSpec],
) -> AdResult<()> {
    if brief.products.is_empty() {
        return Err(AdError::validation("brief must contain at least one product"));
    }

    let mut seen = HashSet::new();
    let mut slugs: HashMap<String, String> = HashMap::new();
    for (i, p) in brief.products.iter_mut().enumerate() {
        if p.name.trim().is_empty() || p.message.trim().is_empty() {
            return Err(AdError::validation(format!(
                "product #{i} must have non-empty 'name' and 'message'"
            )));
        }
        if p.id.trim().is_empty() {
            p.id = slugify(&p.name);
        }
        if !seen.insert(p.id.clone()) {
            return Err(AdError::validation(format!(
                "duplicate product id '{}'",
                p.id
            )));
        }
        // Output directories are keyed by slug.
        if let Some(other) = slugs.insert(slugify(&p.id), p.id.clone()) {
            return Err(AdError::validation(format!(
                "product ids '{other}' and '{}' share the output slug '{}'",
                p.id,
                slugify(&p.id)
            )));
        }
    }

    if brief.locale.trim().is_empty() {
        brief.locale = crate::brief::model::default_locale();
    }

    if brief.aspect_ratios.is_empty() {
        brief.aspect_ratios = aspect_table.iter().map(|s| s.label.clone()).collect();
    }
    let mut labels = HashSet::new();
    for label in &brief.aspect_ratios {
        if !aspect_table.iter().any(|s| &s.label == label) {
            return Err(AdError::validation(format!(
                "unknown aspect ratio '{label}'"
            )));
        }
        if !labels.insert(label.as_str()) {
            return Err(AdError::validation(format!(
                "aspect ratio '{label}' listed twice"
            )));
        }
    }

    Ok(())
}

fn resolve_paths(brief: &mut CampaignBrief, root: &Path) {
    if let Some(logo) = brief.brand.logo_path.as_mut()
        && logo.is_relative()
    {
        *logo = root.join(&*logo);
    }
    for p in &mut brief.products {
        if let Some(img) = p.image_path.as_mut()
            && img.is_relative()
        {
            *img = root.join(&*img);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::config::default_aspect_ratios;

    fn write_brief(dir: &Path, json: &str) -> std::path::PathBuf {
        let path = dir.join("brief.json");
        let mut f = File::create(&path).unwrap();
        f.write_all(json.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_defaults_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_brief(
            dir.path(),
            r##"{
                "campaign_name": "Spring",
                "brand": { "name": "Acme", "primary_color": "#ff0000", "logo_path": "logo.png" },
                "products": [
                    { "name": "Smart Speaker", "message": "Sound that fills the room",
                      "image_path": "ref/speaker.png" }
                ]
            }"##,
        );

        let brief = load_brief(&path, &default_aspect_ratios()).unwrap();
        assert_eq!(brief.products[0].id, "smart-speaker");
        assert_eq!(brief.locale, "en_US");
        assert_eq!(brief.target_region, "Unknown");
        assert_eq!(brief.aspect_ratios, vec!["1x1", "9x16", "16x9"]);
        assert_eq!(brief.brand.logo_path, Some(dir.path().join("logo.png")));
        assert_eq!(
            brief.products[0].image_path,
            Some(dir.path().join("ref/speaker.png"))
        );
    }

    #[test]
    fn rejects_empty_products_and_unknown_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_brief(dir.path(), r#"{ "products": [] }"#);
        let err = load_brief(&path, &default_aspect_ratios()).unwrap_err();
        assert!(matches!(err, AdError::Validation(_)));

        let path = write_brief(
            dir.path(),
            r#"{ "products": [ { "name": "A", "message": "m" } ], "aspect_ratios": ["4x5"] }"#,
        );
        let err = load_brief(&path, &default_aspect_ratios()).unwrap_err();
        assert!(err.to_string().contains("4x5"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_brief(
            dir.path(),
            r#"{ "products": [ { "name": "Same", "message": "a" }, { "name": "same", "message": "b" } ] }"#,
        );
        let err = load_brief(&path, &default_aspect_ratios()).unwrap_err();
        assert!(err.to_string().contains("duplicate product id"));
    }

    #[test]
    fn rejects_ids_that_collide_after_slugging() {
        for (a, b) in [("Mug", "mug"), ("a_b", "a-b")] {
            let mut brief: CampaignBrief = serde_json::from_str(&format!(
                r#"{{ "products": [ {{ "id": "{a}", "name": "One", "message": "x" }},
                                   {{ "id": "{b}", "name": "Two", "message": "y" }} ] }}"#
            ))
            .unwrap();
            let err = normalize_brief(&mut brief, &default_aspect_ratios()).unwrap_err();
            assert!(matches!(err, AdError::Validation(_)));
            assert!(err.to_string().contains("share the output slug"), "{err}");
        }
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_brief(dir.path(), "{ not json");
        assert!(matches!(
            load_brief(&path, &default_aspect_ratios()),
            Err(AdError::Validation(_))
        ));
    }
}

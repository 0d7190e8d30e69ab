use std::fmt::Write as _;

use crate::generate::GenerationRequest;
use crate::review::judge::ReviewContext;

/// Aspect-aware background prompt.
///
/// `reference_size` is the pixel size of the attached product photo, when there is one.
pub fn generation_prompt(request: &GenerationRequest<'_>, reference_size: Option<(u32, u32)>) -> String {
    let c = request.campaign;
    let canvas = request.spec.canvas;
    let zone_pct = (request.spec.safe_zone_fraction * 100.0).round();
    let mut p = String::new();

    let _ = writeln!(
        p,
        "Create a photographic hero image for the campaign '{}' by the brand '{}'. \
         It runs in {} for {}; keep that region and audience exactly as given and let \
         them set the environment, mood and lighting.",
        c.campaign_name, c.brand_name, c.target_region, c.audience
    );
    if let Some(tone) = &c.tone {
        let _ = writeln!(p, "Brand tone: {tone}.");
    }

    let _ = writeln!(
        p,
        "\nThe main subject is the product '{}', rendered with realistic materials, \
         lighting and proportions so it is instantly recognizable.",
        request.product.name
    );
    let _ = writeln!(
        p,
        "The campaign message is \"{}\". Use it only to choose what to emphasize and which \
         setting, season or use case to show. Never render these words.",
        request.copy
    );

    p.push_str("\nPRODUCT GEOMETRY:\n");
    if let Some((w, h)) = reference_size {
        let _ = writeln!(
            p,
            "- The attached reference photo shows the product in a frame about {w}x{h} px; \
             treat its width-to-height ratio as ground truth."
        );
    }
    p.push_str(
        "- Keep the product's silhouette and proportions. Scale it uniformly only; never \
         stretch, squash or reshape it.\n\
         - Fill leftover canvas with environment (room, surface, decor), never by \
         distorting the product.\n\
         - Camera angle may change, geometry may not.\n",
    );

    let _ = write!(
        p,
        "\nCOMPOSITION:\n\
         - Orientation: {}; canvas {}x{} px.\n\
         - Keep the product in the upper part of the frame, fully visible.\n\
         - The bottom ~{zone_pct}% must stay calm and uncluttered yet photographic (a table \
         edge, floor, soft foreground blur), slightly darker than the scene so light \
         overlay text stays legible. No flat color blocks or abstract gradients.\n\
         - Keep the bottom corners especially simple; a small white logo card goes there.\n\
         - Use the brand color {} only as subtle accents (rim light, reflections, a small \
         object). Never as a large solid area.\n",
        canvas.orientation(),
        canvas.width,
        canvas.height,
        c.primary_color
    );
    if !c.accent_colors.is_empty() {
        let _ = writeln!(
            p,
            "- Secondary accent colors, used sparingly: {}.",
            c.accent_colors.join(", ")
        );
    }

    p.push_str(
        "\nHARD CONSTRAINTS:\n\
         - No words, letters, numbers, captions, buttons or user-interface elements anywhere.\n\
         - No standalone logos or logotypes; only markings physically on the product.\n\
         - The result is a clean product photograph; text and logo are added later.\n",
    );

    if let Some(guidance) = request.guidance {
        let _ = write!(
            p,
            "\nREVIEWER FEEDBACK ON EARLIER ATTEMPTS (address all of it):\n{guidance}\n"
        );
    }
    p
}

/// Judge prompt asking for the fixed verdict JSON.
pub fn review_prompt(ctx: &ReviewContext<'_>) -> String {
    let c = ctx.campaign;
    let mut p = format!(
        "You review digital ad creatives for legal safety, brand compliance and visual \
         quality.\n\n\
         CAMPAIGN: {}\nBRAND: {}\nPRIMARY BRAND COLOR: {}\nTARGET REGION: {}\nAUDIENCE: {}\n\
         PRODUCT: {}\nFORMAT: {}\n\n\
         Check:\n\
         1) Legal and policy safety: nothing illegal, hateful or otherwise disallowed.\n\
         2) Brand compliance: mood fits the audience and region, brand color used tastefully, \
         a clear focal product, a calm area at the bottom for overlays.\n\
         3) Quality: composition, lighting, realism, product proportions.\n\n\
         The copy panel and white logo card were added programmatically after generation. \
         Do not grade their typography, placement or styling; grade the scene underneath.\n",
        c.campaign_name,
        c.brand_name,
        c.primary_color,
        c.target_region,
        c.audience,
        ctx.product_name,
        ctx.aspect_label,
    );

    if !ctx.banned_words().is_empty() {
        let list = ctx
            .banned_words()
            .iter()
            .map(|w| format!("\"{w}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            p,
            "\nBANNED WORDS: [{list}]. If any of them (or an obvious variant) is visible \
             anywhere, including overlays and packaging, set legal_compliant=false and \
             compliant=false and name the word in the feedback.\n"
        );
    }

    p.push_str(
        "\nAnswer with one JSON object and nothing else (no markdown, no commentary):\n\
         {\"legal_compliant\": bool, \"brand_compliant\": bool, \"compliant\": bool, \
         \"quality_score\": integer 0-100, \"feedback\": string}\n\
         compliant is true only when legal_compliant and brand_compliant are both true. \
         feedback is 1-3 sentences of concrete changes that would improve the background.\n",
    );
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::context::CampaignContext;
    use crate::brief::model::Product;
    use crate::config::AspectRatioSpec;

    fn campaign(banned: &[&str]) -> CampaignContext {
        CampaignContext {
            campaign_name: "Summer Sound".into(),
            brand_name: "Acme".into(),
            primary_color: "#0055ff".into(),
            accent_colors: vec!["#ffcc00".into()],
            tone: Some("warm".into()),
            target_region: "Canada".into(),
            audience: "young families".into(),
            locale: "en_CA".into(),
            banned_words: banned.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn product() -> Product {
        Product {
            id: "speaker".into(),
            name: "Smart Speaker".into(),
            message: "Music everywhere".into(),
            message_localized: Default::default(),
            image_path: None,
        }
    }

    #[test]
    fn generation_prompt_carries_geometry_and_guidance() {
        let c = campaign(&[]);
        let p = product();
        let spec = AspectRatioSpec::new("9x16", 1080, 1920, 0.25);
        let req = GenerationRequest {
            product: &p,
            spec: &spec,
            campaign: &c,
            copy: "Music everywhere",
            guidance: Some("less glare"),
            attempt: 2,
        };
        let text = generation_prompt(&req, Some((800, 1200)));
        assert!(text.contains("portrait; canvas 1080x1920"));
        assert!(text.contains("bottom ~25%"));
        assert!(text.contains("#0055ff"));
        assert!(text.contains("#ffcc00"));
        assert!(text.contains("about 800x1200 px"));
        assert!(text.contains("less glare"));

        let first = GenerationRequest {
            guidance: None,
            ..req
        };
        assert!(!generation_prompt(&first, None).contains("REVIEWER FEEDBACK"));
    }

    #[test]
    fn review_prompt_lists_banned_words_only_when_present() {
        let p = product();
        let plain = campaign(&[]);
        let ctx = ReviewContext {
            campaign: &plain,
            product_name: &p.name,
            copy: &p.message,
            aspect_label: "1x1",
            attempt: 1,
        };
        let text = review_prompt(&ctx);
        assert!(text.contains("CAMPAIGN: Summer Sound"));
        assert!(!text.contains("BANNED WORDS"));

        let strict = campaign(&["free", "guaranteed"]);
        let ctx = ReviewContext {
            campaign: &strict,
            ..ctx
        };
        assert!(review_prompt(&ctx).contains(r#"BANNED WORDS: ["free", "guaranteed"]"#));
    }
}

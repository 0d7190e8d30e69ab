use serde::{Deserialize, Serialize};

use crate::foundation::error::{AdError, AdResult};

/// A judge's decision on one composite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewVerdict {
    pub legal_compliant: bool,
    pub brand_compliant: bool,
    pub compliant: bool,
    /// 0-100, higher is better.
    pub quality_score: u8,
    pub feedback: String,
}

impl ReviewVerdict {
    /// Build a verdict, enforcing the same rules as [`parse_verdict`].
    pub fn new(
        legal_compliant: bool,
        brand_compliant: bool,
        compliant: bool,
        quality_score: i64,
        feedback: impl Into<String>,
    ) -> AdResult<Self> {
        let quality_score = u8::try_from(quality_score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                AdError::verdict_parse(format!("quality_score {quality_score} is outside 0..=100"))
            })?;
        if compliant && !(legal_compliant && brand_compliant) {
            return Err(AdError::verdict_parse(format!(
                "compliant=true contradicts legal_compliant={legal_compliant}, \
                 brand_compliant={brand_compliant}"
            )));
        }
        Ok(Self {
            legal_compliant,
            brand_compliant,
            compliant,
            quality_score,
            feedback: feedback.into(),
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireVerdict {
    legal_compliant: bool,
    brand_compliant: bool,
    compliant: bool,
    quality_score: i64,
    feedback: String,
}

/// Parse a judge response into a verdict.
///
/// Markdown code fences around the object are tolerated; anything else off-contract
/// (missing or extra fields, wrong types, out-of-range score, inconsistent flags) is a
/// [`AdError::VerdictParse`]. Nothing is defaulted.
pub fn parse_verdict(raw: &str) -> AdResult<ReviewVerdict> {
    let body = strip_json_fences(raw);
    if body.is_empty() {
        return Err(AdError::verdict_parse("empty judge response"));
    }
    let wire: WireVerdict =
        serde_json::from_str(body).map_err(|e| AdError::verdict_parse(e.to_string()))?;
    ReviewVerdict::new(
        wire.legal_compliant,
        wire.brand_compliant,
        wire.compliant,
        wire.quality_score,
        wire.feedback.trim(),
    )
}

/// Drop a surrounding markdown code fence (with or without a language tag), if present.
pub fn strip_json_fences(raw: &str) -> &str {
    let s = raw.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

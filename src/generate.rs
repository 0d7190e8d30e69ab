use crate::brief::context::CampaignContext;
use crate::brief::model::Product;
use crate::config::AspectRatioSpec;
use crate::foundation::error::AdResult;

/// Everything a generator needs for one background attempt.
#[derive(Clone, Copy, Debug)]
pub struct GenerationRequest<'a> {
    pub product: &'a Product,
    pub spec: &'a AspectRatioSpec,
    pub campaign: &'a CampaignContext,
    /// Localized marketing copy; guides the scene, never rendered by the generator.
    pub copy: &'a str,
    /// Reviewer feedback from earlier attempts of the same unit.
    pub guidance: Option<&'a str>,
    /// 1-based attempt index within the unit.
    pub attempt: u32,
}

/// Produces encoded background image bytes (PNG, JPEG, ...) for one request.
///
/// Failures are [`AdError::Generation`](crate::AdError::Generation) for transient
/// problems (transport, timeout, quota, content policy) or
/// [`AdError::Account`](crate::AdError::Account) when credentials are rejected.
pub trait BackgroundGenerator: Send + Sync {
    fn generate_background(&self, request: &GenerationRequest<'_>) -> AdResult<Vec<u8>>;
}

impl<T: BackgroundGenerator + ?Sized> BackgroundGenerator for &T {
    fn generate_background(&self, request: &GenerationRequest<'_>) -> AdResult<Vec<u8>> {
        (**self).generate_background(request)
    }
}

/// Reviewer feedback carried from one attempt to the next.
///
/// Only non-compliant verdicts add notes; failed attempts leave it unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Guidance {
    notes: Vec<String>,
}

impl Guidance {
    pub fn record(&mut self, feedback: &str) {
        let note = feedback.trim();
        if !note.is_empty() {
            self.notes.push(note.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Prompt-ready text, most recent note last. `None` while empty.
    pub fn render(&self) -> Option<String> {
        match self.notes.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(
                many.iter()
                    .enumerate()
                    .map(|(i, n)| format!("{}. {n}", i + 1))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guidance_skips_blank_feedback_and_numbers_history() {
        let mut g = Guidance::default();
        assert_eq!(g.render(), None);
        g.record("   ");
        assert!(g.is_empty());
        g.record(" brighter scene ");
        assert_eq!(g.render().as_deref(), Some("brighter scene"));
        g.record("less clutter at the bottom");
        assert_eq!(
            g.render().as_deref(),
            Some("1. brighter scene\n2. less clutter at the bottom")
        );
        assert_eq!(g.notes().len(), 2);
    }
}

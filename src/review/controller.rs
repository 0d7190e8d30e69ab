//! Review-and-regenerate loop for one (product, aspect ratio) unit.
//!
//! ```text
//! Pending -> AwaitingVerdict -> Accepted
//!                 |  ^
//!                 v  |
//!            Regenerating -> Exhausted
//! ```
//!
//! Each attempt asks the generator for a background, composes it and asks the judge for a
//! verdict. Remote failures and malformed verdicts burn an attempt; input defects end
//! the unit at once.

use image::RgbaImage;
use serde::Serialize;

use crate::assets::decode::{decode_logo, decode_raster};
use crate::assets::source::AssetSource;
use crate::brief::context::CampaignContext;
use crate::brief::model::Product;
use crate::compose::{Composite, CompositeLayout, Typography, compose};
use crate::config::AspectRatioSpec;
use crate::foundation::cancel::CancelFlag;
use crate::foundation::error::{AdError, AdResult};
use crate::generate::{BackgroundGenerator, GenerationRequest, Guidance};
use crate::review::judge::{ComplianceJudge, ReviewContext};
use crate::review::verdict::ReviewVerdict;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    AwaitingVerdict,
    Regenerating,
    Accepted,
    Exhausted,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitStatus {
    Accepted,
    ExhaustedNonCompliant,
    Failed,
}

impl UnitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ExhaustedNonCompliant => "exhausted-non-compliant",
            Self::Failed => "failed",
        }
    }
}

/// A composite that made it through review.
#[derive(Clone, Debug)]
pub struct ReviewAttempt {
    /// 1-based.
    pub attempt: u32,
    pub composite: Composite,
    pub verdict: ReviewVerdict,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptError {
    pub kind: String,
    pub message: String,
}

impl From<&AdError> for AttemptError {
    fn from(e: &AdError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Audit entry for one attempt: the verdict it earned or the error that consumed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ReviewVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AttemptError>,
}

/// Outcome of one unit. Exactly one is produced per (product, aspect ratio) per run.
#[derive(Debug)]
pub struct FinalCreative {
    pub product_id: String,
    pub aspect_label: String,
    pub status: UnitStatus,
    /// The creative to ship; absent on failure.
    pub chosen: Option<ReviewAttempt>,
    pub error: Option<AdError>,
    pub history: Vec<AttemptRecord>,
    pub transitions: Vec<ReviewState>,
}

impl FinalCreative {
    pub fn image(&self) -> Option<&RgbaImage> {
        self.chosen.as_ref().map(|c| &c.composite.image)
    }

    pub fn selected_attempt(&self) -> Option<u32> {
        self.chosen.as_ref().map(|c| c.attempt)
    }

    pub fn verdict(&self) -> Option<&ReviewVerdict> {
        self.chosen.as_ref().map(|c| &c.verdict)
    }

    /// Serializable view used for sidecars and in-memory capture.
    pub fn record(&self) -> CreativeRecord {
        CreativeRecord {
            product_id: self.product_id.clone(),
            aspect_label: self.aspect_label.clone(),
            status: self.status,
            selected_attempt: self.selected_attempt(),
            verdict: self.verdict().cloned(),
            layout: self.chosen.as_ref().map(|c| c.composite.layout.clone()),
            error: self.error.as_ref().map(AttemptError::from),
            history: self.history.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreativeRecord {
    pub product_id: String,
    pub aspect_label: String,
    pub status: UnitStatus,
    pub selected_attempt: Option<u32>,
    pub verdict: Option<ReviewVerdict>,
    pub layout: Option<CompositeLayout>,
    pub error: Option<AttemptError>,
    pub history: Vec<AttemptRecord>,
    pub transitions: Vec<ReviewState>,
}

/// Inputs of one unit, borrowed from the run.
#[derive(Clone, Copy, Debug)]
pub struct UnitJob<'a> {
    pub product: &'a Product,
    pub spec: &'a AspectRatioSpec,
    pub campaign: &'a CampaignContext,
    pub copy: &'a str,
    pub logo: Option<&'a AssetSource>,
}

/// Drives units through generate -> compose -> review with a fixed attempt budget.
pub struct ReviewLoop<'a, G: ?Sized, J: ?Sized> {
    generator: &'a G,
    judge: &'a J,
    typography: &'a Typography,
    max_attempts: u32,
    cancel: CancelFlag,
}

impl<'a, G, J> ReviewLoop<'a, G, J>
where
    G: BackgroundGenerator + ?Sized,
    J: ComplianceJudge + ?Sized,
{
    pub fn new(generator: &'a G, judge: &'a J, typography: &'a Typography) -> Self {
        Self {
            generator,
            judge,
            typography,
            max_attempts: 3,
            cancel: CancelFlag::new(),
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_unit(&self, job: &UnitJob<'_>) -> FinalCreative {
        let span = tracing::info_span!(
            "unit",
            product = %job.product.id,
            aspect = %job.spec.label
        );
        let _enter = span.enter();

        let mut unit = UnitProgress::new(job);
        if self.max_attempts == 0 {
            return unit.fail(AdError::validation("max_attempts must be >= 1"));
        }

        let logo = match job.logo.map(decode_logo).transpose() {
            Ok(logo) => logo,
            Err(e) => return unit.fail(e),
        };

        let mut guidance = Guidance::default();
        let mut best: Option<ReviewAttempt> = None;

        for attempt in 1..=self.max_attempts {
            if self.cancel.is_cancelled() {
                return unit.fail(AdError::cancelled(format!(
                    "run interrupted before attempt {attempt}"
                )));
            }
            if attempt > 1 {
                unit.transition(ReviewState::Regenerating);
            }

            match self.attempt(job, logo.as_ref(), &guidance, attempt, &mut unit) {
                Ok((composite, verdict)) => {
                    tracing::info!(
                        attempt,
                        legal = verdict.legal_compliant,
                        brand = verdict.brand_compliant,
                        compliant = verdict.compliant,
                        score = verdict.quality_score,
                        feedback = %verdict.feedback,
                        "verdict"
                    );
                    unit.history.push(AttemptRecord {
                        attempt,
                        verdict: Some(verdict.clone()),
                        error: None,
                    });
                    let reviewed = ReviewAttempt {
                        attempt,
                        composite,
                        verdict,
                    };
                    if reviewed.verdict.compliant {
                        unit.transition(ReviewState::Accepted);
                        return unit.finish(UnitStatus::Accepted, reviewed);
                    }
                    guidance.record(&reviewed.verdict.feedback);
                    // Strictly greater keeps the earliest attempt on ties.
                    if best
                        .as_ref()
                        .is_none_or(|b| reviewed.verdict.quality_score > b.verdict.quality_score)
                    {
                        best = Some(reviewed);
                    }
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, kind = e.kind(), error = %e, "attempt failed; retrying");
                    unit.history.push(AttemptRecord {
                        attempt,
                        verdict: None,
                        error: Some(AttemptError::from(&e)),
                    });
                }
                Err(e) => {
                    unit.history.push(AttemptRecord {
                        attempt,
                        verdict: None,
                        error: Some(AttemptError::from(&e)),
                    });
                    return unit.fail(e);
                }
            }
        }

        unit.transition(ReviewState::Exhausted);
        match best {
            Some(best) => {
                tracing::warn!(
                    selected = best.attempt,
                    score = best.verdict.quality_score,
                    "attempt budget spent without a compliant creative"
                );
                unit.finish(UnitStatus::ExhaustedNonCompliant, best)
            }
            None => unit.fail(AdError::Exhausted {
                attempts: self.max_attempts,
            }),
        }
    }

    fn attempt(
        &self,
        job: &UnitJob<'_>,
        logo: Option<&RgbaImage>,
        guidance: &Guidance,
        attempt: u32,
        unit: &mut UnitProgress,
    ) -> AdResult<(Composite, ReviewVerdict)> {
        let guidance = guidance.render();
        let request = GenerationRequest {
            product: job.product,
            spec: job.spec,
            campaign: job.campaign,
            copy: job.copy,
            guidance: guidance.as_deref(),
            attempt,
        };
        let bytes = self.generator.generate_background(&request)?;
        let background = decode_raster(&bytes)
            .map_err(|e| AdError::generation(format!("undecodable background: {e}")))?;
        let composite = compose(&background, job.copy, logo, job.spec, self.typography)?;

        unit.transition(ReviewState::AwaitingVerdict);
        let context = ReviewContext {
            campaign: job.campaign,
            product_name: &job.product.name,
            copy: job.copy,
            aspect_label: &job.spec.label,
            attempt,
        };
        let verdict = self.judge.judge(&composite, &context)?;
        Ok((composite, verdict))
    }
}

struct UnitProgress {
    product_id: String,
    aspect_label: String,
    history: Vec<AttemptRecord>,
    transitions: Vec<ReviewState>,
}

impl UnitProgress {
    fn new(job: &UnitJob<'_>) -> Self {
        Self {
            product_id: job.product.id.clone(),
            aspect_label: job.spec.label.clone(),
            history: Vec::new(),
            transitions: vec![ReviewState::Pending],
        }
    }

    fn transition(&mut self, to: ReviewState) {
        let from = self.transitions.last().copied();
        tracing::debug!(?from, ?to, "review state");
        self.transitions.push(to);
    }

    fn finish(self, status: UnitStatus, chosen: ReviewAttempt) -> FinalCreative {
        FinalCreative {
            product_id: self.product_id,
            aspect_label: self.aspect_label,
            status,
            chosen: Some(chosen),
            error: None,
            history: self.history,
            transitions: self.transitions,
        }
    }

    fn fail(mut self, error: AdError) -> FinalCreative {
        tracing::error!(kind = error.kind(), error = %error, "unit failed");
        self.transition(ReviewState::Failed);
        FinalCreative {
            product_id: self.product_id,
            aspect_label: self.aspect_label,
            status: UnitStatus::Failed,
            chosen: None,
            error: Some(error),
            history: self.history,
            transitions: self.transitions,
        }
    }
}

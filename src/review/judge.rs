use crate::brief::context::CampaignContext;
use crate::compose::Composite;
use crate::foundation::error::AdResult;
use crate::review::verdict::ReviewVerdict;

/// What the judge is told alongside the creative.
#[derive(Clone, Copy, Debug)]
pub struct ReviewContext<'a> {
    pub campaign: &'a CampaignContext,
    pub product_name: &'a str,
    pub copy: &'a str,
    pub aspect_label: &'a str,
    pub attempt: u32,
}

impl ReviewContext<'_> {
    pub fn banned_words(&self) -> &[String] {
        &self.campaign.banned_words
    }
}

/// Reviews a composite for legal, brand and quality criteria.
///
/// Transport failures are [`AdError::Judge`](crate::AdError::Judge), off-contract
/// responses [`AdError::VerdictParse`](crate::AdError::VerdictParse).
pub trait ComplianceJudge: Send + Sync {
    fn judge(&self, composite: &Composite, context: &ReviewContext<'_>) -> AdResult<ReviewVerdict>;
}

impl<T: ComplianceJudge + ?Sized> ComplianceJudge for &T {
    fn judge(&self, composite: &Composite, context: &ReviewContext<'_>) -> AdResult<ReviewVerdict> {
        (**self).judge(composite, context)
    }
}

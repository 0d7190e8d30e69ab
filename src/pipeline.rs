use serde::Serialize;

use crate::brief::context::CampaignContext;
use crate::brief::locale::{choose_message_for_locale, summarize_brand};
use crate::brief::model::CampaignBrief;
use crate::compose::Typography;
use crate::config::{AspectRatioSpec, RunConfig};
use crate::foundation::cancel::CancelFlag;
use crate::foundation::error::{AdError, AdResult};
use crate::generate::BackgroundGenerator;
use crate::review::controller::{
    AttemptError, FinalCreative, ReviewLoop, UnitJob, UnitStatus,
};
use crate::review::judge::ComplianceJudge;
use crate::sink::CreativeSink;

/// Handed to the sink before the first unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    pub campaign_name: String,
    pub locale: String,
    pub product_ids: Vec<String>,
    pub aspect_labels: Vec<String>,
    pub max_attempts: u32,
}

impl RunInfo {
    pub fn unit_count(&self) -> usize {
        self.product_ids.len() * self.aspect_labels.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub product_id: String,
    pub aspect_label: String,
    pub status: UnitStatus,
    pub selected_attempt: Option<u32>,
    pub quality_score: Option<u8>,
    pub attempts_used: usize,
    pub error: Option<AttemptError>,
}

impl From<&FinalCreative> for UnitSummary {
    fn from(c: &FinalCreative) -> Self {
        Self {
            product_id: c.product_id.clone(),
            aspect_label: c.aspect_label.clone(),
            status: c.status,
            selected_attempt: c.selected_attempt(),
            quality_score: c.verdict().map(|v| v.quality_score),
            attempts_used: c.history.len(),
            error: c.error.as_ref().map(AttemptError::from),
        }
    }
}

/// Per-unit outcome of a run, in delivery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub campaign_name: String,
    pub units: Vec<UnitSummary>,
    pub accepted: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn add(&mut self, unit: UnitSummary) {
        match unit.status {
            UnitStatus::Accepted => self.accepted += 1,
            UnitStatus::ExhaustedNonCompliant => self.exhausted += 1,
            UnitStatus::Failed => self.failed += 1,
        }
        self.units.push(unit);
    }

    pub fn all_failed(&self) -> bool {
        !self.units.is_empty() && self.failed == self.units.len()
    }
}

/// Runs every (product, aspect ratio) unit of a brief and feeds the results to a sink.
pub struct Orchestrator<'a, G: ?Sized, J: ?Sized> {
    generator: &'a G,
    judge: &'a J,
    config: &'a RunConfig,
    typography: &'a Typography,
    cancel: CancelFlag,
}

impl<'a, G, J> Orchestrator<'a, G, J>
where
    G: BackgroundGenerator + ?Sized,
    J: ComplianceJudge + ?Sized,
{
    pub fn new(
        generator: &'a G,
        judge: &'a J,
        config: &'a RunConfig,
        typography: &'a Typography,
    ) -> Self {
        Self {
            generator,
            judge,
            config,
            typography,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag the embedding caller can set to stop the run between attempts.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Process products in brief order, each across the brief's aspect ratios.
    ///
    /// Units run on a pool of `config.workers` threads; results reach `sink` in unit
    /// order no matter which worker finished first. Only invalid input or a failing sink
    /// stop the run early; unit failures are reported per unit.
    pub fn run(&self, brief: &CampaignBrief, sink: &mut dyn CreativeSink) -> AdResult<RunSummary> {
        self.config.validate()?;
        let specs = self.resolve_specs(brief)?;
        if brief.products.is_empty() {
            return Err(AdError::validation("brief must contain at least one product"));
        }

        let brand = summarize_brand(brief);
        tracing::info!(
            campaign = %brief.campaign_name,
            logo_present = brand.logo_present,
            brand_color_defined = brand.brand_color_defined,
            "brand configuration"
        );

        let campaign = CampaignContext::from_brief(brief);
        let logo = brief.brand.logo_source();
        let review = ReviewLoop::new(self.generator, self.judge, self.typography)
            .max_attempts(self.config.max_attempts)
            .cancel_flag(self.cancel.clone());

        let jobs: Vec<UnitJob<'_>> = brief
            .products
            .iter()
            .flat_map(|product| {
                let copy = choose_message_for_locale(product, &brief.locale);
                specs.iter().map(move |spec| (product, *spec, copy))
            })
            .map(|(product, spec, copy)| UnitJob {
                product,
                spec,
                campaign: &campaign,
                copy,
                logo: logo.as_ref(),
            })
            .collect();

        let info = RunInfo {
            campaign_name: brief.campaign_name.clone(),
            locale: brief.locale.clone(),
            product_ids: brief.products.iter().map(|p| p.id.clone()).collect(),
            aspect_labels: specs.iter().map(|s| s.label.clone()).collect(),
            max_attempts: self.config.max_attempts,
        };
        let run_span = tracing::info_span!("run", campaign = %brief.campaign_name);
        let _enter = run_span.enter();
        tracing::info!(
            units = info.unit_count(),
            workers = self.config.workers,
            max_attempts = self.config.max_attempts,
            "run started"
        );

        sink.begin(&info)?;
        let mut summary = RunSummary {
            campaign_name: brief.campaign_name.clone(),
            ..RunSummary::default()
        };

        let pool = build_thread_pool(self.config.workers)?;
        for chunk in jobs.chunks(self.config.workers) {
            let finished: Vec<FinalCreative> = if chunk.len() == 1 {
                vec![review.run_unit(&chunk[0])]
            } else {
                use rayon::prelude::*;
                pool.install(|| chunk.par_iter().map(|job| review.run_unit(job)).collect())
            };
            for creative in &finished {
                summary.add(UnitSummary::from(creative));
                sink.push(creative)?;
            }
        }

        summary.cancelled = self.cancel.is_cancelled();
        tracing::info!(
            accepted = summary.accepted,
            exhausted = summary.exhausted,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "run finished"
        );
        sink.end(&summary)?;
        Ok(summary)
    }

    fn resolve_specs<'b>(&'b self, brief: &CampaignBrief) -> AdResult<Vec<&'b AspectRatioSpec>> {
        let labels: Vec<&str> = if brief.aspect_ratios.is_empty() {
            self.config
                .aspect_ratios
                .iter()
                .map(|s| s.label.as_str())
                .collect()
        } else {
            brief.aspect_ratios.iter().map(String::as_str).collect()
        };
        labels
            .into_iter()
            .map(|label| {
                self.config.aspect(label).ok_or_else(|| {
                    AdError::validation(format!("aspect ratio '{label}' is not configured"))
                })
            })
            .collect()
    }
}

fn build_thread_pool(workers: usize) -> AdResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("adcraft-unit-{i}"))
        .build()
        .map_err(|e| AdError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;
use serde::Serialize;

use crate::brief::locale::slugify;
use crate::foundation::error::{AdError, AdResult};
use crate::pipeline::{RunInfo, RunSummary};
use crate::review::controller::{CreativeRecord, FinalCreative};

/// Receives unit results in deterministic order.
pub trait CreativeSink: Send {
    /// Called once before any unit is pushed.
    fn begin(&mut self, info: &RunInfo) -> AdResult<()>;
    /// One call per unit, products in brief order, aspect ratios within each product.
    fn push(&mut self, creative: &FinalCreative) -> AdResult<()>;
    /// Called once after the last unit.
    fn end(&mut self, summary: &RunSummary) -> AdResult<()>;
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySink {
    info: Option<RunInfo>,
    records: Vec<CreativeRecord>,
    images: Vec<Option<RgbaImage>>,
    summary: Option<RunSummary>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> Option<&RunInfo> {
        self.info.as_ref()
    }

    pub fn records(&self) -> &[CreativeRecord] {
        &self.records
    }

    /// Chosen image per record, `None` for failed units.
    pub fn images(&self) -> &[Option<RgbaImage>] {
        &self.images
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }
}

impl CreativeSink for InMemorySink {
    fn begin(&mut self, info: &RunInfo) -> AdResult<()> {
        self.info = Some(info.clone());
        self.records.clear();
        self.images.clear();
        self.summary = None;
        Ok(())
    }

    fn push(&mut self, creative: &FinalCreative) -> AdResult<()> {
        self.records.push(creative.record());
        self.images.push(creative.image().cloned());
        Ok(())
    }

    fn end(&mut self, summary: &RunSummary) -> AdResult<()> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}

/// Writes `<root>/<product>/<aspect>.png`, a `<aspect>.review.json` sidecar per unit and
/// `<root>/summary.json` at the end.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file written by the current run, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_json<T: Serialize>(&mut self, path: PathBuf, value: &T) -> AdResult<()> {
        let f = File::create(&path).with_context(|| format!("create '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, value)
            .with_context(|| format!("write '{}'", path.display()))?;
        w.flush()
            .with_context(|| format!("flush '{}'", path.display()))?;
        self.written.push(path);
        Ok(())
    }
}

impl CreativeSink for DirectorySink {
    fn begin(&mut self, info: &RunInfo) -> AdResult<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create output dir '{}'", self.root.display()))?;
        self.written.clear();
        tracing::info!(
            root = %self.root.display(),
            units = info.unit_count(),
            "writing creatives"
        );
        Ok(())
    }

    fn push(&mut self, creative: &FinalCreative) -> AdResult<()> {
        let dir = self.root.join(slugify(&creative.product_id));
        let sidecar = dir.join(format!("{}.review.json", creative.aspect_label));
        if self.written.contains(&sidecar) {
            return Err(AdError::validation(format!(
                "product '{}' aspect '{}' would overwrite '{}' from an earlier unit",
                creative.product_id,
                creative.aspect_label,
                sidecar.display()
            )));
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create product dir '{}'", dir.display()))?;

        if let Some(image) = creative.image() {
            let png = dir.join(format!("{}.png", creative.aspect_label));
            image
                .save_with_format(&png, image::ImageFormat::Png)
                .with_context(|| format!("write '{}'", png.display()))?;
            tracing::info!(path = %png.display(), status = creative.status.as_str(), "saved creative");
            self.written.push(png);
        }

        self.write_json(sidecar, &creative.record())
    }

    fn end(&mut self, summary: &RunSummary) -> AdResult<()> {
        let path = self.root.join("summary.json");
        self.write_json(path, summary)
    }
}

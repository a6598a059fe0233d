// Orchestrator: runs the mirror pipeline phase by phase

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::Settings;
use crate::constants;
use crate::disassemble::{self, Disassembler};
use crate::error::{Error, Result};
use crate::extract;
use crate::index;
use crate::model::{NamespaceId, ResolvedArtifact};
use crate::pipeline::{Concurrency, parallel_map};
use crate::remote::Fetch;
use crate::ui;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplodeSummary {
    /// Namespaces kept after prefix filtering.
    pub namespaces: usize,
    /// Artifact versions listed by the namespace indexes.
    pub artifacts: usize,
    /// Artifacts whose file type could not be resolved.
    pub dropped: usize,
    pub downloads: usize,
    pub class_files: usize,
    pub dumps: usize,
    pub extraction_failures: usize,
    pub disassembly_failures: usize,
}

/// A downloaded archive and the directory it explodes into.
struct Download {
    archive: PathBuf,
    destination: PathBuf,
}

/// One run of the pipeline against a remote repository.
///
/// Phases run strictly one after another; the work items of each phase run
/// concurrently. Remote index failures and download failures abort the run;
/// everything else is counted in the [`ExplodeSummary`].
pub struct Exploder {
    settings: Settings,
    fetcher: Arc<dyn Fetch>,
    disassembler: Arc<dyn Disassembler>,
}

impl Exploder {
    pub fn new(
        settings: Settings,
        fetcher: Arc<dyn Fetch>,
        disassembler: Arc<dyn Disassembler>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            disassembler,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run(&self) -> Result<ExplodeSummary> {
        let mut summary = ExplodeSummary::default();
        info!(
            "Mirroring {} into {} (disassembler: {})",
            self.settings.base_url,
            self.settings.output_dir.display(),
            self.disassembler.name()
        );

        let namespaces = self.fetch_namespaces().await?;
        summary.namespaces = namespaces.len();
        info!("Found {} namespace(s)", namespaces.len());

        let artifacts = self.resolve_coordinates(namespaces).await?;
        summary.artifacts = artifacts.len();
        info!("Found {} artifact version(s)", artifacts.len());

        let resolved = self.resolve_file_types(artifacts).await?;
        summary.dropped = summary.artifacts - resolved.len();

        let downloads = self.download_binaries(resolved).await?;
        summary.downloads = downloads.len();

        let (class_files, extraction_failures) = self.extract(downloads).await?;
        summary.class_files = class_files.len();
        summary.extraction_failures = extraction_failures;

        let (dumps, disassembly_failures) = self.disassemble(class_files).await?;
        summary.dumps = dumps;
        summary.disassembly_failures = disassembly_failures;

        info!(
            "Done: {} download(s), {} class file(s), {} dump(s), {} dropped, {} extraction failure(s), {} disassembly failure(s)",
            summary.downloads,
            summary.class_files,
            summary.dumps,
            summary.dropped,
            summary.extraction_failures,
            summary.disassembly_failures
        );
        Ok(summary)
    }

    async fn fetch_namespaces(&self) -> Result<Vec<NamespaceId>> {
        let url = self.settings.base_url.join(constants::MASTER_INDEX_FILE);
        let xml = self.fetcher.fetch_string(&url).await?;
        let namespaces = index::parse_namespace_index(&xml)?;

        Ok(namespaces
            .into_iter()
            .filter(|namespace| namespace.matches_any(&self.settings.namespace_prefixes))
            .collect())
    }

    async fn resolve_coordinates(
        &self,
        namespaces: Vec<NamespaceId>,
    ) -> Result<Vec<ResolvedArtifact>> {
        let bar = ui::phase_bar("Resolving coordinates", namespaces.len());
        let base = self.settings.base_url.clone();

        let per_namespace = parallel_map(namespaces, self.network(), |namespace| {
            let fetcher = Arc::clone(&self.fetcher);
            let url = namespace.index_url(&base);
            let bar = bar.clone();
            async move {
                let xml = fetcher.fetch_string(&url).await?;
                let artifacts = index::parse_coordinate_index(&namespace, &xml)?;
                debug!("{}: {} artifact version(s)", namespace, artifacts.len());
                bar.inc(1);
                Ok::<_, Error>(artifacts)
            }
        })
        .await;
        bar.finish_and_clear();

        Ok(per_namespace?.into_iter().flatten().collect())
    }

    /// Artifacts whose POM cannot be fetched or parsed are dropped.
    async fn resolve_file_types(
        &self,
        artifacts: Vec<ResolvedArtifact>,
    ) -> Result<Vec<ResolvedArtifact>> {
        let bar = ui::phase_bar("Resolving file types", artifacts.len());
        let base = self.settings.base_url.clone();

        let resolved = parallel_map(artifacts, self.network(), |artifact| {
            let fetcher = Arc::clone(&self.fetcher);
            let url = artifact.pom_url(&base);
            let bar = bar.clone();
            async move {
                let file_type = fetcher
                    .fetch_string(&url)
                    .await
                    .and_then(|pom| index::parse_file_type(&pom));
                bar.inc(1);
                match file_type {
                    Ok(file_type) => {
                        let artifact = artifact.with_file_type(file_type);
                        info!("Resolved {}", artifact);
                        Ok::<_, Error>(Some(artifact))
                    }
                    Err(e) => {
                        warn!("Dropping {}: {}", artifact.coordinate(), e);
                        Ok(None)
                    }
                }
            }
        })
        .await;
        bar.finish_and_clear();

        Ok(resolved?.into_iter().flatten().collect())
    }

    async fn download_binaries(&self, artifacts: Vec<ResolvedArtifact>) -> Result<Vec<Download>> {
        let bar = ui::phase_bar("Downloading", artifacts.len());
        let base = self.settings.base_url.clone();
        let output_root = self.settings.output_dir.clone();

        let downloads = parallel_map(artifacts, self.network(), |artifact| {
            let fetcher = Arc::clone(&self.fetcher);
            let url = artifact.binary_url(&base);
            let destination = output_root.join(artifact.output_dir());
            let archive = destination.join(artifact.binary_file_name());
            let bar = bar.clone();
            async move {
                tokio::fs::create_dir_all(&destination)
                    .await
                    .map_err(|e| Error::io(&destination, e))?;
                let size = fetcher.download_to(&url, &archive).await?;
                info!("Downloaded {} ({} bytes)", artifact, size);
                bar.inc(1);
                Ok::<_, Error>(Download {
                    archive,
                    destination,
                })
            }
        })
        .await;
        bar.finish_and_clear();

        downloads
    }

    /// Returns every class file found and the number of archives that failed.
    async fn extract(&self, downloads: Vec<Download>) -> Result<(Vec<PathBuf>, usize)> {
        let bar = ui::phase_bar("Extracting", downloads.len());

        let outcomes = parallel_map(downloads, self.io(), |download| {
            let bar = bar.clone();
            async move {
                let outcome = tokio::task::spawn_blocking(move || {
                    extract::explode_archive(&download.archive, &download.destination)
                })
                .await?;
                bar.inc(1);
                Ok::<_, Error>(outcome)
            }
        })
        .await;
        bar.finish_and_clear();

        let mut class_files = Vec::new();
        let mut failures = 0;
        for outcome in outcomes? {
            match outcome {
                Ok(found) => class_files.extend(found),
                Err(e) => {
                    warn!("{}", error_chain(&e));
                    failures += 1;
                }
            }
        }
        Ok((class_files, failures))
    }

    /// Returns the number of listings written and the number of failures.
    async fn disassemble(&self, class_files: Vec<PathBuf>) -> Result<(usize, usize)> {
        let bar = ui::phase_bar("Disassembling", class_files.len());

        let outcomes = parallel_map(class_files, self.io(), |class_file| {
            let disassembler = Arc::clone(&self.disassembler);
            let bar = bar.clone();
            async move {
                let outcome = tokio::task::spawn_blocking(move || {
                    disassemble::dump_class(disassembler.as_ref(), &class_file)
                })
                .await?;
                bar.inc(1);
                Ok::<_, Error>(outcome)
            }
        })
        .await;
        bar.finish_and_clear();

        let mut dumps = 0;
        let mut failures = 0;
        for outcome in outcomes? {
            match outcome {
                Ok(_) => dumps += 1,
                Err(e) => {
                    warn!("{}", error_chain(&e));
                    failures += 1;
                }
            }
        }
        Ok((dumps, failures))
    }

    fn network(&self) -> Concurrency {
        self.settings.network_concurrency()
    }

    fn io(&self) -> Concurrency {
        self.settings.io_concurrency()
    }
}

/// `outer: inner: innermost`, for one-line warnings.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

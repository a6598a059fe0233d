// Config module: settings resolved from CLI flags, the settings file and defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::cli::Cli;
use crate::constants;
use crate::disassemble::DisassemblerKind;
use crate::model::RepositoryUrl;
use crate::pipeline::Concurrency;

/// Optional `exploder.toml`; every key falls back to its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    /// Namespace prefixes; an empty list mirrors every namespace.
    pub namespaces: Option<Vec<String>>,
    pub io_workers: Option<usize>,
    pub max_concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub disassembler: Option<DisassemblerKind>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub base_url: RepositoryUrl,
    /// Empty means every namespace of the master index.
    pub namespace_prefixes: Vec<String>,
    pub io_workers: usize,
    pub max_concurrency: Option<usize>,
    pub timeout: Duration,
    pub disassembler: DisassemblerKind,
}

impl Settings {
    /// Defaults for mirroring `base_url` into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, base_url: RepositoryUrl) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_url,
            namespace_prefixes: vec![constants::DEFAULT_NAMESPACE_PREFIX.to_string()],
            io_workers: constants::DEFAULT_IO_WORKERS,
            max_concurrency: None,
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            disassembler: DisassemblerKind::default(),
        }
    }

    /// CLI flags win over the settings file, which wins over defaults.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let output_dir = output_dir(cli)?;
        let file = match config_path(cli, &output_dir) {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                ConfigFile::load(&path)?
            }
            None => ConfigFile::default(),
        };
        Self::merge(cli, file, output_dir)
    }

    fn merge(cli: &Cli, file: ConfigFile, output_dir: PathBuf) -> Result<Self> {
        let raw_base = cli
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or_else(|| constants::DEFAULT_BASE_URL.to_string());
        let mut settings = Self::new(output_dir, RepositoryUrl::parse(&raw_base)?);

        if cli.all_namespaces {
            settings.namespace_prefixes.clear();
        } else if !cli.namespaces.is_empty() {
            settings.namespace_prefixes = cli.namespaces.clone();
        } else if let Some(namespaces) = file.namespaces {
            settings.namespace_prefixes = namespaces;
        }

        if let Some(io_workers) = cli.io_workers.or(file.io_workers) {
            anyhow::ensure!(io_workers > 0, "io_workers must be at least 1");
            settings.io_workers = io_workers;
        }
        if let Some(limit) = cli.max_concurrency.or(file.max_concurrency) {
            anyhow::ensure!(limit > 0, "max_concurrency must be at least 1");
            settings.max_concurrency = Some(limit);
        }
        if let Some(secs) = cli.timeout_secs.or(file.timeout_secs) {
            anyhow::ensure!(secs > 0, "timeout_secs must be at least 1");
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(kind) = cli.disassembler.or(file.disassembler) {
            settings.disassembler = kind;
        }

        Ok(settings)
    }

    /// Concurrency of the HTTP phases.
    pub fn network_concurrency(&self) -> Concurrency {
        Concurrency::from_limit(self.max_concurrency)
    }

    /// Concurrency of the extraction and disassembly phases.
    pub fn io_concurrency(&self) -> Concurrency {
        Concurrency::Limited(self.io_workers)
    }
}

pub fn output_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.output_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to resolve the current directory"),
    }
}

/// An explicit `--config` is always used; the default file only when it exists.
fn config_path(cli: &Cli, output_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = &cli.config {
        return Some(path.clone());
    }
    let default = output_dir.join(constants::CONFIG_FILE);
    default.is_file().then_some(default)
}

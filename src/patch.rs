//! In-place file patching.
//!
//! Reads the target file whole, runs one or both passes over it and
//! overwrites it. There is no backup and no atomic rename: a write that is
//! interrupted can leave the file truncated.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::FixConfig;
use crate::error::{FixError, FixResult};
use crate::normalizer::{NormalizeStats, PatternNormalizer};
use crate::rewriter::{BlockRewriter, RewriteStats};

/// One transformation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Rename the company inside client insert blocks.
    Blocks,
    /// Strip company guards and rename company subqueries.
    Clauses,
}

impl Pass {
    /// Both passes, in the order `all` runs them.
    pub const ALL: [Pass; 2] = [Pass::Blocks, Pass::Clauses];
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Blocks => write!(f, "blocks"),
            Pass::Clauses => write!(f, "clauses"),
        }
    }
}

/// Counters for whichever pass ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PassStats {
    Blocks(RewriteStats),
    Clauses(NormalizeStats),
}

/// Outcome of one pass over one file.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    pub path: PathBuf,
    pub pass: Pass,
    /// Output differs from input
    pub changed: bool,
    /// File was overwritten
    pub written: bool,
    pub stats: PassStats,
    /// Confirmation line for humans
    pub message: String,
}

/// Runs passes against the configured file.
#[derive(Debug, Clone)]
pub struct Patcher {
    config: FixConfig,
    rewriter: BlockRewriter,
    normalizer: PatternNormalizer,
    dry_run: bool,
}

impl Patcher {
    pub fn new(config: FixConfig) -> Self {
        let rewriter = BlockRewriter::new(config.markers.clone(), config.rename.clone());
        let normalizer = PatternNormalizer::new(&config.rename);
        Self {
            config,
            rewriter,
            normalizer,
            dry_run: false,
        }
    }

    /// Transform and report without touching the file.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &FixConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.file
    }

    /// Apply a single pass to in-memory text.
    pub fn apply(&self, pass: Pass, text: &str) -> (String, PassStats) {
        match pass {
            Pass::Blocks => {
                let (out, stats) = self.rewriter.rewrite(text);
                (out, PassStats::Blocks(stats))
            }
            Pass::Clauses => {
                let (out, stats) = self.normalizer.normalize(text);
                (out, PassStats::Clauses(stats))
            }
        }
    }

    /// Confirmation line printed after a pass.
    pub fn message(&self, pass: Pass) -> String {
        let to = &self.config.rename.to;
        match pass {
            Pass::Blocks => format!("Changed all clients company_id to {}", to),
            Pass::Clauses => format!(
                "Fixed remaining AND company_id clauses and changed all clients to use {} company",
                to
            ),
        }
    }

    /// Run one pass: read the file, transform, overwrite.
    pub fn run(&self, pass: Pass) -> FixResult<PatchReport> {
        let text = self.read()?;
        let (_, report) = self.run_on(pass, text)?;
        Ok(report)
    }

    /// Run every pass in order, each one seeing the previous pass's output.
    pub fn run_all(&self) -> FixResult<Vec<PatchReport>> {
        let mut text = self.read()?;
        let mut reports = Vec::with_capacity(Pass::ALL.len());
        for pass in Pass::ALL {
            let (out, report) = self.run_on(pass, text)?;
            text = out;
            reports.push(report);
        }
        Ok(reports)
    }

    fn run_on(&self, pass: Pass, text: String) -> FixResult<(String, PatchReport)> {
        let (out, stats) = self.apply(pass, &text);
        let changed = out != text;

        let written = !self.dry_run;
        if written {
            self.write(&out)?;
        }

        tracing::info!(
            file = %self.path().display(),
            %pass,
            changed,
            written,
            "pass finished"
        );

        let report = PatchReport {
            path: self.path().to_path_buf(),
            pass,
            changed,
            written,
            stats,
            message: self.message(pass),
        };
        Ok((out, report))
    }

    fn read(&self) -> FixResult<String> {
        let path = self.path();
        tracing::debug!("Reading {}", path.display());
        std::fs::read_to_string(path).map_err(|e| FixError::read(path, e))
    }

    fn write(&self, text: &str) -> FixResult<()> {
        let path = self.path();
        tracing::debug!("Writing {} bytes to {}", text.len(), path.display());
        std::fs::write(path, text).map_err(|e| FixError::write(path, e))
    }
}

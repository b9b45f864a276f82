//! Block rewriter.
//!
//! Scans a SQL file line by line and renames a company literal only inside
//! client insert blocks:
//!
//! ```text
//! INSERT INTO clients (name, company_id)          <- block_start, copied
//! SELECT 'Ana', (SELECT id FROM companies ...)    <- rewritten
//! WHERE NOT EXISTS (                              <- block_end, copied
//!   SELECT 1 FROM clients WHERE name = 'Ana'      <- trailer, copied
//! ) RETURNING id;                                 <- terminal, copied
//! ```
//!
//! Every input line produces exactly one output line. Missing markers never
//! drop content: the rest of the input is copied as-is.
//!
//! Lines end at `\n` only (a `\r\n` pair stays attached to its line). A lone
//! `\r` is not a line break, so old Mac-style files are scanned as a single
//! line and markers on different `\r`-separated lines count as one line.

use serde::Serialize;

use crate::config::{Markers, Rename};

/// Position of the scanner relative to the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Outside,
    InBlock,
    InTrailer,
}

impl ScanState {
    /// State after emitting `line`.
    pub fn next(self, line: &str, markers: &Markers) -> ScanState {
        match self {
            ScanState::Outside if line.contains(&markers.block_start) => ScanState::InBlock,
            ScanState::Outside => ScanState::Outside,
            ScanState::InBlock if line.contains(&markers.block_end) => {
                // the end line doubles as the terminal line when both appear
                if line.contains(&markers.terminal) {
                    ScanState::Outside
                } else {
                    ScanState::InTrailer
                }
            }
            ScanState::InBlock => ScanState::InBlock,
            ScanState::InTrailer if line.contains(&markers.terminal) => ScanState::Outside,
            ScanState::InTrailer => ScanState::InTrailer,
        }
    }
}

/// Counters collected during one rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    /// Lines read (and written)
    pub lines: usize,
    /// Blocks opened
    pub blocks: usize,
    /// Lines whose content changed
    pub lines_changed: usize,
    /// Input ended inside a block
    pub unterminated: bool,
}

/// Renames a company literal inside marker-delimited blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockRewriter {
    markers: Markers,
    rename: Rename,
}

impl BlockRewriter {
    pub fn new(markers: Markers, rename: Rename) -> Self {
        Self { markers, rename }
    }

    /// Rewrite a sequence of lines. The output has the same length as the input.
    pub fn rewrite_lines<S: AsRef<str>>(&self, lines: &[S]) -> (Vec<String>, RewriteStats) {
        let mut out = Vec::with_capacity(lines.len());
        let mut stats = RewriteStats {
            lines: lines.len(),
            ..RewriteStats::default()
        };
        let mut state = ScanState::Outside;

        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref();

            let emitted = match state {
                ScanState::InBlock
                    if !line.contains(&self.markers.block_end)
                        && line.contains(&self.rename.from) =>
                {
                    line.replace(&self.rename.from, &self.rename.to)
                }
                _ => line.to_string(),
            };
            if emitted != line {
                stats.lines_changed += 1;
            }
            out.push(emitted);

            let next = state.next(line, &self.markers);
            match (state, next) {
                (ScanState::Outside, ScanState::InBlock) => {
                    stats.blocks += 1;
                    tracing::debug!(line = idx + 1, "block opened");
                }
                (ScanState::InBlock | ScanState::InTrailer, ScanState::Outside) => {
                    tracing::debug!(line = idx + 1, "block closed");
                }
                _ => {}
            }
            state = next;
        }

        if state != ScanState::Outside {
            stats.unterminated = true;
            tracing::warn!(
                "input ended inside a block (missing '{}'); remaining lines copied unchanged",
                self.markers.terminal
            );
        }

        (out, stats)
    }

    /// Rewrite whole text, keeping each line's own terminator.
    pub fn rewrite(&self, text: &str) -> (String, RewriteStats) {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let (out, stats) = self.rewrite_lines(&lines);
        (out.concat(), stats)
    }
}

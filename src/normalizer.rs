//! Pattern normalizer.
//!
//! Two whole-text substitutions, applied in order:
//!
//! 1. drop every `AND company_id = (SELECT id FROM companies WHERE name = '...')`
//!    guard, together with the whitespace in front of it;
//! 2. point company subqueries for the old name at the new name.
//!
//! Neither step looks at line boundaries.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::Rename;

/// Whitespace tolerant between every token; `\b` keeps `BRAND company_id` intact.
const COMPANY_GUARD_PATTERN: &str = r"\s*\bAND\s+company_id\s*=\s*\(\s*SELECT\s+id\s+FROM\s+companies\s+WHERE\s+name\s*=\s*'[^']+'\s*\)";

static COMPANY_GUARD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMPANY_GUARD_PATTERN).expect("company guard pattern is valid"));

/// The canonical company lookup subquery for `name`.
pub fn company_subquery(name: &str) -> String {
    format!("(SELECT id FROM companies WHERE name = '{}')", name)
}

/// Counters collected during one normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub clauses_removed: usize,
    pub subqueries_renamed: usize,
}

impl NormalizeStats {
    pub fn is_noop(&self) -> bool {
        self.clauses_removed == 0 && self.subqueries_renamed == 0
    }
}

/// Strips company guards and renames company subqueries.
#[derive(Debug, Clone)]
pub struct PatternNormalizer {
    old_subquery: String,
    new_subquery: String,
    guard: Regex,
}

impl PatternNormalizer {
    pub fn new(rename: &Rename) -> Self {
        Self {
            old_subquery: company_subquery(&rename.from),
            new_subquery: company_subquery(&rename.to),
            guard: COMPANY_GUARD_REGEX.clone(),
        }
    }

    /// Remove every company guard clause. Returns the text and the match count.
    ///
    /// Repeats until no guard is left: dropping a nested guard can close up
    /// the one around it.
    pub fn strip_clauses(&self, text: &str) -> (String, usize) {
        let mut out = text.to_string();
        let mut removed = 0;
        while self.guard.is_match(&out) {
            removed += self.guard.find_iter(&out).count();
            out = self.guard.replace_all(&out, "").into_owned();
        }
        (out, removed)
    }

    /// Replace exact old-name subqueries with new-name ones.
    pub fn rename_subqueries(&self, text: &str) -> (String, usize) {
        if self.old_subquery == self.new_subquery {
            return (text.to_string(), 0);
        }
        let renamed = text.matches(self.old_subquery.as_str()).count();
        if renamed == 0 {
            return (text.to_string(), 0);
        }
        (text.replace(&self.old_subquery, &self.new_subquery), renamed)
    }

    /// Apply both substitutions, guards first.
    pub fn normalize(&self, text: &str) -> (String, NormalizeStats) {
        let (stripped, clauses_removed) = self.strip_clauses(text);
        let (out, subqueries_renamed) = self.rename_subqueries(&stripped);
        tracing::debug!(clauses_removed, subqueries_renamed, "normalized text");
        (
            out,
            NormalizeStats {
                clauses_removed,
                subqueries_renamed,
            },
        )
    }
}

impl Default for PatternNormalizer {
    fn default() -> Self {
        Self::new(&Rename::default())
    }
}

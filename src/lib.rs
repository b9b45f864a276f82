//! # sqlfix — patch generated SQL import files
//!
//! Two passes over an `import-data.sql` style file:
//!
//! - **blocks**: inside each `INSERT INTO clients` block, rename the old
//!   company (`Designer 4 You`) to the new one (`JJ`), up to the
//!   `WHERE NOT EXISTS` guard. Line count never changes.
//! - **clauses**: strip `AND company_id = (SELECT id FROM companies ...)`
//!   guards and point remaining company subqueries at the new name.
//!
//! ## Quick Example
//!
//! ```
//! use sqlfix::prelude::*;
//!
//! let sql = "\
//! INSERT INTO clients (name, company_id)
//! SELECT 'Ana', (SELECT id FROM companies WHERE name = 'Designer 4 You')
//! WHERE NOT EXISTS (SELECT 1) RETURNING id;
//! ";
//! let (out, stats) = BlockRewriter::default().rewrite(sql);
//! assert!(out.contains("name = 'JJ'"));
//! assert_eq!(stats.lines_changed, 1);
//! ```

pub mod config;
pub mod error;
pub mod normalizer;
pub mod patch;
pub mod rewriter;

pub mod prelude {
    pub use crate::config::{FixConfig, Markers, Rename};
    pub use crate::error::*;
    pub use crate::normalizer::{NormalizeStats, PatternNormalizer, company_subquery};
    pub use crate::patch::{Pass, PassStats, PatchReport, Patcher};
    pub use crate::rewriter::{BlockRewriter, RewriteStats, ScanState};
}

/// Run both passes over in-memory SQL with the default markers and rename.
///
/// # Example
///
/// ```
/// let out = sqlfix::fix_text("x AND company_id = (SELECT id FROM companies WHERE name = 'Acme')");
/// assert_eq!(out, "x");
/// ```
pub fn fix_text(input: &str) -> String {
    let (blocks, _) = rewriter::BlockRewriter::default().rewrite(input);
    let (out, _) = normalizer::PatternNormalizer::default().normalize(&blocks);
    out
}

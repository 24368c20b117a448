//! Settlement lifecycle orchestration.
//!
//! [`SettlementBuilder`] composes an uncommitted draft with running totals;
//! [`ReconciliationEngine`] owns the committed lifecycle: commit, edit,
//! incremental adjustments, deletion with unlink, year-to-date aggregation,
//! and the load-link consistency sweep.

mod draft;
mod reconcile;

pub use draft::SettlementBuilder;
pub use reconcile::{
    CommitOutcome, LinkAuditReport, LinkRecord, ReconciliationEngine, SettlementInput, YtdSummary,
};

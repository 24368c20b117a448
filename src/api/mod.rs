//! HTTP API module for the Settlement Reconciliation Engine.
//!
//! This module provides the REST boundary consumed by presentation,
//! statement-rendering, and reporting layers: settlement queries and
//! mutations, eligible-load lookup, year-to-date summaries, and the
//! load-link consistency sweep.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AddAdjustmentRequest, AdjustmentRequest, EligibleLoadsQuery, ListSettlementsQuery,
    SettlementRequest, SortOrderParam, SortParam, YtdQuery,
};
pub use response::{ApiError, DeleteResponse, SettlementResponse};
pub use state::AppState;

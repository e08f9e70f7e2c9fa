//! Outcome of a mempool reorg.

use shared_types::ObjectId;

/// Summary of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorgReport {
    /// Non-coinbase transactions of the abandoned blocks, oldest first.
    pub orphaned: Vec<ObjectId>,
    /// Candidates re-admitted, in final pending order.
    pub readmitted: Vec<ObjectId>,
    /// Candidates that no longer apply on the new tip.
    pub dropped: Vec<ObjectId>,
}

use std::fmt;

use thiserror::Error;

/// Query path stage that refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Optimize,
    Retrieve,
    Compose,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStage::Optimize => "optimize",
            QueryStage::Retrieve => "retrieve",
            QueryStage::Compose => "compose",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query rejected at {stage} stage: {reason}")]
    Rejected { stage: QueryStage, reason: String },

    #[error("Index generation {snapshot} is stale, latest is {latest}")]
    Stale { snapshot: u64, latest: u64 },
}

impl QueryError {
    pub fn rejected(stage: QueryStage, reason: impl fmt::Display) -> Self {
        QueryError::Rejected { stage, reason: reason.to_string() }
    }
}

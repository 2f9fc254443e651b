use std::fmt;

/// Progress of a single delivery through the worker.
///
/// `Received -> Parsed -> Computed -> Persisted`. A delivery that gets past
/// `Persisted` is acked as [`ProcessOutcome::Ack`]; a failure reports the last
/// stage it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Parsed,
    Computed,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Received => "received",
            Stage::Parsed => "parsed",
            Stage::Computed => "computed",
            Stage::Persisted => "persisted",
        };
        write!(f, "{}", s)
    }
}

/// What the worker decided about a delivery, independent of the transport's
/// own ack/nack calls. `stage` is the last stage the delivery completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Ack,
    /// Never retried. The message is dead-lettered.
    RejectPermanent { stage: Stage, reason: String },
    /// Requeued for redelivery.
    RejectRetryable { stage: Stage, reason: String },
}

impl ProcessOutcome {
    pub fn is_ack(&self) -> bool {
        matches!(self, ProcessOutcome::Ack)
    }

    pub fn requeue(&self) -> bool {
        matches!(self, ProcessOutcome::RejectRetryable { .. })
    }
}

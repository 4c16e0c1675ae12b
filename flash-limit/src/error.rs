use std::num::ParseFloatError;
use std::num::ParseIntError;

/// Errors raised while building an [`AdmissionConfig`](crate::AdmissionConfig).
///
/// These are fatal at startup: an instance must refuse to serve rather than run
/// with undefined capacity or ratio semantics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `maxPermission` is not a base-10 integer.
    #[error("maxPermission {value:?} is not an integer: {source}")]
    InvalidMaxPermission {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// `maxPermission` is negative.
    #[error("maxPermission must not be negative, got {0}")]
    NegativeMaxPermission(i64),

    /// `blockRatio` is not a decimal number.
    #[error("blockRatio {value:?} is not a number: {source}")]
    InvalidBlockRatio {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    /// `blockRatio` lies outside `[0.0, 1.0]` or is NaN.
    #[error("blockRatio must be within [0.0, 1.0], got {0}")]
    BlockRatioOutOfRange(f64),

    /// `startTime` could not be parsed to an instant.
    #[error("startTime {value:?} is not a valid date/time: {reason}")]
    InvalidStartTime { value: String, reason: String },
}

/// Errors reported by a [`CounterClient`](crate::CounterClient).
///
/// These are never fatal. A failed counter update is logged and skipped, the
/// admission decision proceeds on local state alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinationError {
    /// The shared counter service could not be reached.
    #[error("cluster counter unreachable: {0}")]
    Unreachable(String),

    /// The outbound signal queue is full; the update was dropped.
    #[error("cluster counter queue is full; update dropped")]
    QueueFull,

    /// The forwarding worker has shut down.
    #[error("cluster counter forwarder is closed")]
    Closed,
}

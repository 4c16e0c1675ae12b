use std::time::Duration;
use std::time::SystemTime;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveTime;
use tracing::debug;

use crate::BlockRatio;
use crate::ConfigError;

/// The cluster counter admissions are reported to unless configured otherwise.
pub const DEFAULT_COUNTER_NAME: &str = "counter";

const MAX_PERMISSION: &str = "maxPermission";
const BLOCK_RATIO: &str = "blockRatio";
const START_TIME: &str = "startTime";
const COUNTER_NAME: &str = "counterName";

// Epoch values below this are taken to be seconds rather than milliseconds (1973-03-03).
const MIN_EPOCH_MILLIS: u64 = 100_000_000_000;

/// Immutable admission parameters, created once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmissionConfig {
    max_permission: u64,
    block_ratio: BlockRatio,
    start_time: SystemTime,
    counter_name: String,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_permission: 0,
            block_ratio: BlockRatio::NONE,
            start_time: SystemTime::UNIX_EPOCH,
            counter_name: DEFAULT_COUNTER_NAME.to_string(),
        }
    }
}

impl AdmissionConfig {
    /// Creates a new `AdmissionConfig`.
    ///
    /// # Arguments
    ///
    /// * `max_permission` - The maximum number of requests one controller will admit.
    /// * `block_ratio` - The share of eligible requests shed at random.
    /// * `start_time` - The instant the sale opens. Earlier requests are `NotStarted`.
    pub fn new(max_permission: u64, block_ratio: BlockRatio, start_time: SystemTime) -> Self {
        Self {
            max_permission,
            block_ratio,
            start_time,
            ..Self::default()
        }
    }

    /// Sets the name of the cluster counter admissions are reported to.
    pub fn with_counter_name(mut self, name: impl Into<String>) -> Self {
        self.counter_name = name.into();
        self
    }

    /// Builds a configuration from deployment parameters.
    ///
    /// Recognised keys are `maxPermission`, `blockRatio`, `startTime` and
    /// `counterName`. Missing keys keep their defaults (`0`, `0.0`, the UNIX epoch and
    /// `"counter"`), so an absent `startTime` means the sale has already started.
    ///
    /// `startTime` accepts an RFC 3339 date/time with any UTC offset, the same
    /// without an offset and with a space separator (read as UTC), a plain date
    /// (midnight UTC), or a count of milliseconds since the UNIX epoch.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed or out-of-range values.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in params {
            let value = value.as_ref().trim();
            match key.as_ref() {
                MAX_PERMISSION => config.max_permission = parse_max_permission(value)?,
                BLOCK_RATIO => config.block_ratio = parse_block_ratio(value)?,
                START_TIME => config.start_time = parse_start_time(value)?,
                COUNTER_NAME => config.counter_name = value.to_string(),
                other => debug!(key = other, "ignoring unknown admission parameter"),
            }
        }

        Ok(config)
    }

    pub fn max_permission(&self) -> u64 {
        self.max_permission
    }

    pub fn block_ratio(&self) -> BlockRatio {
        self.block_ratio
    }

    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    pub fn counter_name(&self) -> &str {
        &self.counter_name
    }
}

fn parse_max_permission(value: &str) -> Result<u64, ConfigError> {
    let parsed = value
        .parse::<i64>()
        .map_err(|source| ConfigError::InvalidMaxPermission {
            value: value.to_string(),
            source,
        })?;
    u64::try_from(parsed).map_err(|_| ConfigError::NegativeMaxPermission(parsed))
}

fn parse_block_ratio(value: &str) -> Result<BlockRatio, ConfigError> {
    let parsed = value
        .parse::<f64>()
        .map_err(|source| ConfigError::InvalidBlockRatio {
            value: value.to_string(),
            source,
        })?;
    BlockRatio::new(parsed)
}

fn parse_start_time(value: &str) -> Result<SystemTime, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidStartTime {
        value: value.to_string(),
        reason,
    };

    if let Ok(millis) = value.parse::<u64>() {
        if millis < MIN_EPOCH_MILLIS {
            return Err(invalid(
                "epoch values must be in milliseconds, this looks like seconds".to_string(),
            ));
        }
        return Ok(SystemTime::UNIX_EPOCH + Duration::from_millis(millis));
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(SystemTime::from(instant));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(SystemTime::from(date.and_time(NaiveTime::MIN).and_utc()));
    }
    humantime::parse_rfc3339_weak(value).map_err(|e| invalid(e.to_string()))
}

use crate::ConfigError;

/// A uniform sampler over `[0.0, 1.0)`.
///
/// The filter consumes samples but never owns or seeds the source. Any
/// `Fn() -> f64` closure can stand in for a deterministic stub.
pub trait EntropySource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Samples from the thread-local generator of the `rand` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngEntropy;

impl EntropySource for ThreadRngEntropy {
    #[inline]
    fn sample(&self) -> f64 {
        rand::random::<f64>()
    }
}

impl<F> EntropySource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    #[inline]
    fn sample(&self) -> f64 {
        self()
    }
}

/// The share of eligible requests to drop, validated to lie within `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct BlockRatio(f64);

impl BlockRatio {
    /// Never sheds; only the capacity cap applies.
    pub const NONE: BlockRatio = BlockRatio(0.0);
    /// Sheds every request, even with capacity available.
    pub const ALL: BlockRatio = BlockRatio(1.0);

    /// # Errors
    ///
    /// Returns [`ConfigError::BlockRatioOutOfRange`] for values outside `[0.0, 1.0]`
    /// and for NaN.
    pub fn new(ratio: f64) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(ConfigError::BlockRatioOutOfRange(ratio))
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

/// Randomly rejects a configured share of requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadShedFilter {
    block_ratio: BlockRatio,
}

impl LoadShedFilter {
    pub fn new(block_ratio: BlockRatio) -> Self {
        Self { block_ratio }
    }

    /// Draws exactly one sample and admits it if it is not below the block ratio.
    #[inline]
    pub fn should_admit_sample<E>(&self, entropy: &E) -> bool
    where
        E: EntropySource + ?Sized,
    {
        entropy.sample() >= self.block_ratio.get()
    }

    pub fn block_ratio(&self) -> BlockRatio {
        self.block_ratio
    }
}

//! Adaptive low-pass smoothing of noisy, irregularly sampled scalar signals.
//!
//! Implements the 1€ filter described on <https://gery.casiez.net/1euro/>:
//! an exponential low-pass filter whose cutoff frequency follows the
//! estimated signal velocity. Slow signals get a low cutoff and heavy
//! smoothing, fast signals a high cutoff and little lag.
//!
//! Feed one `(value, timestamp)` pair at a time into [`OneEuroFilter`] and
//! consume one filtered scalar back. [`LowPassFilter`] is the reusable
//! smoothing primitive underneath it.

#![cfg_attr(not(test), no_std)]

pub mod low_pass_filter;
pub mod one_euro_filter;

pub use self::low_pass_filter::LowPassFilter;
pub use self::one_euro_filter::OneEuroFilter;

/// Returned when a tunable is given a value outside of its valid range.
///
/// Raised only by constructors and setters. Filtering itself never fails,
/// even on degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidParameter(pub(crate) &'static str);

impl InvalidParameter {
    pub fn message(&self) -> &'static str {
        self.0
    }
}

impl core::fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

impl core::error::Error for InvalidParameter {}

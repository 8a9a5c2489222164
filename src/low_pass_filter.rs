//! Stateful exponential low-pass filter over a scalar sequence.
//!
//! Each output is a convex combination of the new raw sample and the
//! previous output, `alpha * x + (1 - alpha) * s`. The very first sample
//! passes through unchanged so the filter does not blend against an
//! arbitrary seed.

use crate::InvalidParameter;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPassFilter {
    alpha: f32,
    last_raw_value: f32,
    last_filtered_value: f32,
    initialized: bool,
}

impl LowPassFilter {
    /// Creates a filter with the given smoothing coefficient and an initial
    /// value of 0.0.
    pub fn new(alpha: f32) -> Result<Self, InvalidParameter> {
        Self::with_initial_value(alpha, 0.0)
    }

    /// Creates a filter whose recorded raw and filtered values start at
    /// `initial_value`. The first call to [`filter`](Self::filter) still
    /// passes its sample through unchanged.
    pub fn with_initial_value(alpha: f32, initial_value: f32) -> Result<Self, InvalidParameter> {
        let mut filter = Self {
            alpha: 1.0,
            last_raw_value: initial_value,
            last_filtered_value: initial_value,
            initialized: false,
        };
        filter.set_alpha(alpha)?;
        Ok(filter)
    }

    /// Sets the smoothing coefficient. Valid values lie in `(0.0, 1.0]`.
    pub fn set_alpha(&mut self, alpha: f32) -> Result<(), InvalidParameter> {
        if alpha <= 0.0 || alpha > 1.0 {
            return Err(InvalidParameter("alpha must be in (0.0, 1.0]"));
        }
        self.alpha = alpha;
        Ok(())
    }

    /// Feeds one sample through the filter and returns the smoothed value.
    pub fn filter(&mut self, value: f32) -> f32 {
        let result = if self.initialized {
            self.alpha * value + (1.0 - self.alpha) * self.last_filtered_value
        } else {
            self.initialized = true;
            value
        };
        self.last_raw_value = value;
        self.last_filtered_value = result;
        result
    }

    /// Sets the smoothing coefficient, then filters. Equivalent to
    /// [`set_alpha`](Self::set_alpha) followed by [`filter`](Self::filter).
    pub fn filter_with_alpha(&mut self, value: f32, alpha: f32) -> Result<f32, InvalidParameter> {
        self.set_alpha(alpha)?;
        Ok(self.filter(value))
    }

    // Creates a filter with a derived, unvalidated coefficient. The
    // adaptive filter seeds its internal filters from parameters it has
    // already validated itself; the derived coefficient can still be
    // degenerate (e.g. for a denormal cutoff) and is replaced on every
    // filtering call anyway.
    pub(crate) fn with_alpha_unchecked(alpha: f32) -> Self {
        Self {
            alpha,
            last_raw_value: 0.0,
            last_filtered_value: 0.0,
            initialized: false,
        }
    }

    // Applies a coefficient without range validation. The adaptive filter
    // derives its coefficients from a possibly degenerate sampling
    // frequency, and filtering must not fail on such input.
    pub(crate) fn filter_with_alpha_unchecked(&mut self, value: f32, alpha: f32) -> f32 {
        self.alpha = alpha;
        self.filter(value)
    }

    pub fn has_last_raw_value(&self) -> bool {
        self.initialized
    }

    pub fn last_raw_value(&self) -> f32 {
        self.last_raw_value
    }

    pub fn last_filtered_value(&self) -> f32 {
        self.last_filtered_value
    }

    /// Forgets the sample history. The next sample passes through unchanged,
    /// as if the filter was freshly constructed.
    pub fn reset(&mut self) {
        self.initialized = false;
    }
}

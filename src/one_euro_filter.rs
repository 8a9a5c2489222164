//! Velocity-adaptive cutoff control over a pair of low-pass filters.
//!
//! The 1€ filter smooths a signal through a [`LowPassFilter`] whose cutoff
//! frequency is recomputed on every sample: an estimate of the signal
//! velocity, itself smoothed by a second low-pass filter, raises the cutoff
//! during fast motion (less lag) and lets it fall back to `min_cutoff` at
//! rest (less jitter).

use core::f32::consts::PI;

use libm::fabsf;

use crate::low_pass_filter::LowPassFilter;
use crate::InvalidParameter;

pub const DEFAULT_MIN_CUTOFF: f32 = 1.0;
pub const DEFAULT_BETA: f32 = 0.0;
pub const DEFAULT_DERIVATIVE_CUTOFF: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneEuroFilter {
    frequency: f32,
    min_cutoff: f32,
    beta: f32,
    derivative_cutoff: f32,
    value_filter: LowPassFilter,
    derivative_filter: LowPassFilter,
    last_timestamp: Option<f32>,
}

impl OneEuroFilter {
    /// Creates a filter for a signal sampled at `frequency` Hz, with the
    /// default tuning (`min_cutoff` 1.0, `beta` 0.0,
    /// `derivative_cutoff` 1.0).
    ///
    /// The frequency is only an estimate: it is re-derived from timestamp
    /// deltas whenever [`filter_with_timestamp`](Self::filter_with_timestamp)
    /// is given consecutive timestamps.
    pub fn new(frequency: f32) -> Result<Self, InvalidParameter> {
        Self::with_parameters(
            frequency,
            DEFAULT_MIN_CUTOFF,
            DEFAULT_BETA,
            DEFAULT_DERIVATIVE_CUTOFF,
        )
    }

    /// Creates a filter with explicit tuning.
    ///
    /// `frequency`, `min_cutoff`, and `derivative_cutoff` must be strictly
    /// positive. Lower `min_cutoff` removes more jitter at rest; higher
    /// `beta` cuts more lag during fast motion. `beta` is an unconstrained
    /// gain.
    pub fn with_parameters(
        frequency: f32,
        min_cutoff: f32,
        beta: f32,
        derivative_cutoff: f32,
    ) -> Result<Self, InvalidParameter> {
        check_positive(frequency, "frequency must be positive")?;
        check_positive(min_cutoff, "min_cutoff must be positive")?;
        check_positive(derivative_cutoff, "derivative_cutoff must be positive")?;
        Ok(Self {
            frequency,
            min_cutoff,
            beta,
            derivative_cutoff,
            value_filter: LowPassFilter::with_alpha_unchecked(alpha(frequency, min_cutoff)),
            derivative_filter: LowPassFilter::with_alpha_unchecked(alpha(
                frequency,
                derivative_cutoff,
            )),
            last_timestamp: None,
        })
    }

    pub fn set_frequency(&mut self, frequency: f32) -> Result<(), InvalidParameter> {
        check_positive(frequency, "frequency must be positive")?;
        self.frequency = frequency;
        Ok(())
    }

    pub fn set_min_cutoff(&mut self, min_cutoff: f32) -> Result<(), InvalidParameter> {
        check_positive(min_cutoff, "min_cutoff must be positive")?;
        self.min_cutoff = min_cutoff;
        Ok(())
    }

    pub fn set_beta(&mut self, beta: f32) {
        self.beta = beta;
    }

    pub fn set_derivative_cutoff(&mut self, derivative_cutoff: f32) -> Result<(), InvalidParameter> {
        check_positive(derivative_cutoff, "derivative_cutoff must be positive")?;
        self.derivative_cutoff = derivative_cutoff;
        Ok(())
    }

    /// Retunes the three commonly adjusted parameters in one call.
    ///
    /// The parameters are applied in order. On a validation failure the
    /// ones already validated keep their new values, exactly as if the
    /// individual setters had been called one by one.
    pub fn set_parameters(
        &mut self,
        frequency: f32,
        min_cutoff: f32,
        beta: f32,
    ) -> Result<(), InvalidParameter> {
        self.set_frequency(frequency)?;
        self.set_min_cutoff(min_cutoff)?;
        self.set_beta(beta);
        Ok(())
    }

    /// Filters one sample without a timestamp, keeping the current sampling
    /// frequency estimate.
    pub fn filter(&mut self, value: f32) -> f32 {
        self.filter_sample(value, None)
    }

    /// Filters one sample taken at `timestamp`, in the caller's clock unit
    /// (typically seconds). Two consecutive timestamped samples re-estimate
    /// the sampling frequency from their delta.
    ///
    /// Non-increasing timestamps are not guarded against: a negative delta
    /// yields a negative frequency that propagates silently into the
    /// coefficient math. Callers needing robustness validate timestamps
    /// before calling.
    pub fn filter_with_timestamp(&mut self, value: f32, timestamp: f32) -> f32 {
        self.filter_sample(value, Some(timestamp))
    }

    fn filter_sample(&mut self, value: f32, timestamp: Option<f32>) -> f32 {
        if let (Some(last), Some(current)) = (self.last_timestamp, timestamp) {
            if current != last {
                self.frequency = 1.0 / (current - last);
            }
        }
        self.last_timestamp = timestamp;

        // Estimate the current variation per second.
        let velocity = if self.value_filter.has_last_raw_value() {
            (value - self.value_filter.last_filtered_value()) * self.frequency
        } else {
            // FIXME: 0.0 or the raw value?
            0.0
        };
        let smoothed_velocity = self
            .derivative_filter
            .filter_with_alpha_unchecked(velocity, alpha(self.frequency, self.derivative_cutoff));

        // Fast motion raises the cutoff, rest lets it fall back to the minimum.
        let cutoff = self.min_cutoff + self.beta * fabsf(smoothed_velocity);
        self.value_filter
            .filter_with_alpha_unchecked(value, alpha(self.frequency, cutoff))
    }

    /// Forgets the sample history of both owned filters and the last
    /// timestamp. Tuning parameters keep their current values.
    pub fn reset(&mut self) {
        self.value_filter.reset();
        self.derivative_filter.reset();
        self.last_timestamp = None;
    }
}

/// Smoothing coefficient of a first-order low-pass with the given cutoff at
/// the given sampling rate.
fn alpha(frequency: f32, cutoff: f32) -> f32 {
    let sample_period = 1.0 / frequency;
    let time_constant = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + time_constant / sample_period)
}

fn check_positive(value: f32, message: &'static str) -> Result<(), InvalidParameter> {
    if value <= 0.0 {
        return Err(InvalidParameter(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_frequency() {
        assert_eq!(
            OneEuroFilter::new(0.0).unwrap_err().message(),
            "frequency must be positive"
        );
        assert!(OneEuroFilter::new(-120.0).is_err());
    }

    #[test]
    fn rejects_non_positive_cutoffs() {
        assert_eq!(
            OneEuroFilter::with_parameters(120.0, 0.0, 0.0, 1.0)
                .unwrap_err()
                .message(),
            "min_cutoff must be positive"
        );
        assert_eq!(
            OneEuroFilter::with_parameters(120.0, 1.0, 0.0, -1.0)
                .unwrap_err()
                .message(),
            "derivative_cutoff must be positive"
        );
    }

    #[test]
    fn accepts_any_beta() {
        assert!(OneEuroFilter::with_parameters(120.0, 1.0, -5.0, 1.0).is_ok());
        let mut filter = OneEuroFilter::new(120.0).unwrap();
        filter.set_beta(-0.25);
        assert!(filter.filter(1.0).is_finite());
    }

    #[test]
    fn setters_validate_like_construction() {
        let mut filter = OneEuroFilter::new(120.0).unwrap();
        assert!(filter.set_frequency(0.0).is_err());
        assert!(filter.set_min_cutoff(-1.0).is_err());
        assert!(filter.set_derivative_cutoff(0.0).is_err());
        assert!(filter.set_parameters(60.0, 0.5, 1.0).is_ok());
        assert!(filter.set_parameters(60.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn resetting_a_parameter_to_the_same_value_changes_nothing() {
        let mut retuned = OneEuroFilter::with_parameters(120.0, 0.8, 0.3, 1.0).unwrap();
        let mut untouched = retuned;

        retuned.filter(1.0);
        untouched.filter(1.0);
        retuned.set_min_cutoff(0.8).unwrap();
        retuned.set_min_cutoff(0.8).unwrap();
        retuned.set_beta(0.3);

        for sample in [2.0, -1.0, 0.5, 3.0] {
            assert_eq!(retuned.filter(sample), untouched.filter(sample));
        }
    }

    #[test]
    fn coefficient_grows_with_cutoff_and_frequency() {
        let mut previous = alpha(120.0, 0.1);
        for cutoff in [0.5, 1.0, 5.0, 20.0, 100.0] {
            let current = alpha(120.0, cutoff);
            assert!(current > previous);
            previous = current;
        }

        let mut previous = alpha(10.0, 1.0);
        for frequency in [30.0, 60.0, 120.0, 1000.0] {
            let current = alpha(frequency, 1.0);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn coefficient_stays_in_valid_range() {
        for frequency in [1.0, 30.0, 120.0, 10_000.0] {
            for cutoff in [0.01, 1.0, 1_000.0] {
                let a = alpha(frequency, cutoff);
                assert!(a > 0.0 && a <= 1.0, "alpha({frequency}, {cutoff}) = {a}");
            }
        }
    }

    #[test]
    fn denormal_min_cutoff_constructs_and_filters() {
        // The derived coefficient collapses to 0.0 here; only the named
        // parameters are validated, so construction must still succeed.
        let mut filter = OneEuroFilter::with_parameters(120.0, 1e-40, 0.0, 1.0).unwrap();
        assert_eq!(filter.filter(3.0), 3.0);
        assert!(filter.filter(4.0).is_finite());
    }

    #[test]
    fn set_parameters_applies_in_order_until_the_first_invalid_one() {
        let mut filter = OneEuroFilter::new(120.0).unwrap();
        assert!(filter.set_parameters(60.0, 0.0, 1.0).is_err());

        // The frequency was validated before min_cutoff failed, so it is
        // already applied.
        let mut at_60_hz = OneEuroFilter::new(60.0).unwrap();
        for sample in [1.0, 3.0, 2.0] {
            assert_eq!(filter.filter(sample), at_60_hz.filter(sample));
        }
    }

    #[test]
    fn first_sample_without_timestamp_passes_through() {
        let mut filter = OneEuroFilter::new(30.0).unwrap();
        let output = filter.filter(7.0);
        assert_eq!(output, 7.0);
        assert!(output.is_finite());
    }

    #[test]
    fn reset_restores_cold_start_behavior() {
        let mut filter = OneEuroFilter::with_parameters(120.0, 1.0, 0.5, 1.0).unwrap();
        let mut fresh = filter;

        for i in 0..10 {
            filter.filter_with_timestamp(i as f32, i as f32 / 128.0);
        }
        filter.reset();
        // Reset keeps the frequency estimate from the previous run; put it
        // back to compare against the fresh filter.
        filter.set_frequency(120.0).unwrap();

        assert_eq!(filter.filter(5.0), fresh.filter(5.0));
        assert_eq!(filter.filter(6.0), fresh.filter(6.0));
        assert_eq!(filter.filter(4.5), fresh.filter(4.5));
    }
}

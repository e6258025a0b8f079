//! First-order low-pass filter for the measured velocity

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A discrete first-order low-pass filter.
///
/// The first sample after construction or a reset passes through
/// unfiltered, so the filter starts from the measurement rather than from
/// zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowPass {
    /// Smoothing factor, `sample_period / (tau + sample_period)`.
    alpha: f64,

    /// Filter memory, `None` until the first sample.
    state: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LowPass {
    /// Create a new filter with time constant `tau_s`, sampled every
    /// `sample_period_s`.
    ///
    /// A zero time constant gives a pass-through filter.
    pub fn new(tau_s: f64, sample_period_s: f64) -> Self {
        Self {
            alpha: sample_period_s / (tau_s + sample_period_s),
            state: None,
        }
    }

    /// Filter one sample.
    pub fn filt(&mut self, value: f64) -> f64 {
        let filtered = match self.state {
            Some(prev) => prev + self.alpha * (value - prev),
            None => value,
        };

        self.state = Some(filtered);

        filtered
    }

    /// Discard the filter memory.
    pub fn reset(&mut self) {
        self.state = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

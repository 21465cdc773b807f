//! Spectrum Storage Type

/// Type Alias for Frequencies
pub type Frequency = f32;

/// Type Alias for Signal Strengths
pub type SignalStrength = f32;

/// One sided magnitude spectrum of a real signal
///
/// Bucket `i` sits at `i * rate / length` Hz, the last one at the nyquist frequency.
#[derive(Debug, Clone)]
pub struct Spectrum {
    buckets: Vec<SignalStrength>,
    rate: usize,
    length: usize,
}

impl std::ops::Index<usize> for Spectrum {
    type Output = SignalStrength;

    fn index(&self, index: usize) -> &Self::Output {
        &self.buckets[index]
    }
}

impl std::ops::IndexMut<usize> for Spectrum {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.buckets[index]
    }
}

impl Spectrum {
    /// Create a silent spectrum for a transform of `length` samples at `rate` Hz
    ///
    /// # Example
    /// ```
    /// # use loopvis_core::analyzer;
    /// let spectrum = analyzer::Spectrum::new(1024, 48000);
    /// assert_eq!(spectrum.len(), 513);
    /// ```
    pub fn new(length: usize, rate: usize) -> Spectrum {
        Spectrum {
            buckets: vec![0.0; length / 2 + 1],
            rate,
            length,
        }
    }

    /// Sample rate of the analyzed signal
    #[inline]
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Frequency distance between two buckets
    #[inline]
    pub fn width(&self) -> Frequency {
        self.rate as Frequency / self.length as Frequency
    }

    pub fn iter_mut<'a>(&'a mut self) -> std::slice::IterMut<'a, SignalStrength> {
        self.buckets.iter_mut()
    }

    pub fn as_slice(&self) -> &[SignalStrength] {
        &self.buckets
    }

    /// Return the number of buckets in this spectrum
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Return the highest signal strength in this spectrum
    pub fn max(&self) -> SignalStrength {
        self.buckets.iter().cloned().fold(0.0, SignalStrength::max)
    }

    /// Scale down so the strongest bucket is `1.0`
    ///
    /// Spectra which already fit into `[0, 1]` are left alone.  This only looks at the
    /// current frame, there is no running normalization.
    pub fn normalize(&mut self) {
        let max = self.max();

        if max > 1.0 {
            for b in self.buckets.iter_mut() {
                *b /= max;
            }
        }
    }

    /// Map magnitudes onto `[0, 1]` on a decibel scale
    ///
    /// `cutoff` is the (negative) floor in dB which maps to `0.0`, a magnitude of `1.0`
    /// maps to `1.0`.
    pub fn to_decibels(&mut self, cutoff: SignalStrength) {
        let floor = cutoff.abs();

        for b in self.buckets.iter_mut() {
            *b = decibel_level(*b, floor);
        }
    }
}

/// Decibel level of a single magnitude, `floor` being the positive cutoff
#[inline]
fn decibel_level(magnitude: SignalStrength, floor: SignalStrength) -> SignalStrength {
    // log10(0) is -inf, keep it finite
    let decibels = 20.0 * magnitude.max(std::f32::MIN_POSITIVE).log10();

    ((decibels + floor) / floor).max(0.0)
}

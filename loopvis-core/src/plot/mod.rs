//! Bar Plot Model
//!
//! Maps a magnitude spectrum onto a small number of bars.  Spectrum buckets are spread
//! over the bars along a non-linear frequency distribution, bars the distribution skips
//! are interpolated from their neighbors, and every bar carries a peak marker ("hat")
//! which falls back down under gravity.
pub mod distribution;

use crate::analyzer::{Frequency, SignalStrength};
use crate::helpers::lerp;
use std::{ops, time};

/// Builder for Plot
#[derive(Debug, Default, Clone)]
pub struct PlotBuilder {
    /// Lowest frequency getting a bar of its own
    ///
    /// Can also be set from config as `"plot.frequency_low"`.
    pub frequency_low: Option<Frequency>,

    /// Highest frequency getting a bar of its own
    ///
    /// Can also be set from config as `"plot.frequency_high"`.
    pub frequency_high: Option<Frequency>,

    /// Frequency distribution along the bars
    ///
    /// A few distributions are defined in the [`distribution`](distribution/index.html)
    /// module.  Can also be set from config as `"plot.distribution"`.
    pub distribution: Option<fn(f32) -> f32>,

    /// How sluggish bars follow the spectrum, `0.0` means not at all
    ///
    /// Can also be set from config as `"plot.smoothness"`.
    pub smoothness: Option<f32>,

    /// Downward acceleration of the peak markers in levels per second squared
    ///
    /// Can also be set from config as `"plot.gravity"`.
    pub gravity: Option<f32>,

    /// Horizontal space one bar takes
    ///
    /// Can also be set from config as `"plot.bin_width"`.
    pub bin_width: Option<usize>,
}

impl PlotBuilder {
    pub fn new() -> PlotBuilder {
        Default::default()
    }

    pub fn frequency_range(&mut self, low: Frequency, high: Frequency) -> &mut PlotBuilder {
        self.frequency_low = Some(low);
        self.frequency_high = Some(high);
        self
    }

    pub fn distribution(&mut self, f: fn(f32) -> f32) -> &mut PlotBuilder {
        self.distribution = Some(f);
        self
    }

    pub fn smoothness(&mut self, smoothness: f32) -> &mut PlotBuilder {
        self.smoothness = Some(smoothness);
        self
    }

    pub fn gravity(&mut self, gravity: f32) -> &mut PlotBuilder {
        self.gravity = Some(gravity);
        self
    }

    pub fn bin_width(&mut self, width: usize) -> &mut PlotBuilder {
        self.bin_width = Some(width);
        self
    }

    /// Build a plot with a single bar and no spectrum layout yet
    ///
    /// Call [`Plot::recalculate_geometry`] and [`Plot::recalculate_frequency_range`]
    /// before the first update.
    pub fn build(&mut self) -> crate::Result<Plot> {
        let frequency_low = self
            .frequency_low
            .unwrap_or_else(|| crate::CONFIG.get_or("plot.frequency_low", 20.0));
        let frequency_high = self
            .frequency_high
            .unwrap_or_else(|| crate::CONFIG.get_or("plot.frequency_high", 20000.0));
        let distribution = match self.distribution {
            Some(f) => f,
            None => {
                let name = crate::CONFIG.get_or("plot.distribution", "ease_out_exp".to_string());
                distribution::from_str(&name).ok_or(crate::Error::UnknownDistribution(name))?
            }
        };
        let smoothness = self
            .smoothness
            .unwrap_or_else(|| crate::CONFIG.get_or("plot.smoothness", 0.96));
        let gravity = self
            .gravity
            .unwrap_or_else(|| crate::CONFIG.get_or("plot.gravity", 0.75));
        let bin_width = self
            .bin_width
            .unwrap_or_else(|| crate::CONFIG.get_or("plot.bin_width", 16));

        Ok(Plot {
            bin_width: bin_width.max(1),
            frequency_low,
            frequency_high,
            distribution,
            smoothness: smoothness.max(0.0).min(1.0),
            gravity,

            spectrum_low: 0,
            spectrum_high: 0,
            spectrum_size: 0,
            missed: Vec::new(),

            targets: vec![0.0],
            levels: vec![0.0],
            hats: vec![0.0],
            velocities: vec![0.0],
        })
    }
}

pub struct Plot {
    bin_width: usize,
    frequency_low: Frequency,
    frequency_high: Frequency,
    distribution: fn(f32) -> f32,
    smoothness: f32,
    gravity: f32,

    spectrum_low: usize,
    spectrum_high: usize,
    spectrum_size: usize,
    /// Runs of bars no spectrum bucket maps onto
    missed: Vec<ops::Range<usize>>,

    targets: Vec<SignalStrength>,
    levels: Vec<SignalStrength>,
    hats: Vec<SignalStrength>,
    velocities: Vec<f32>,
}

impl std::fmt::Debug for Plot {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Plot {{ bins: {:?}, spectrum: {:?}..={:?} of {:?}, missed: {:?} }}",
            self.num_bins(),
            self.spectrum_low,
            self.spectrum_high,
            self.spectrum_size,
            self.missed,
        )
    }
}

/// Nearest-index resampling of per-bar values onto `n` bars
fn resample(old: &[f32], n: usize) -> Vec<f32> {
    if old.is_empty() {
        return vec![0.0; n];
    }

    (0..n)
        .map(|bin| {
            let i = if n > 1 {
                (bin as f32 * (old.len() - 1) as f32 / (n - 1) as f32).round() as usize
            } else {
                0
            };
            old[i.min(old.len() - 1)]
        })
        .collect()
}

/// Scale values down if any of them exceeds `1.0`
fn normalize(values: &mut [f32]) {
    let max = values.iter().cloned().fold(0.0, f32::max);

    if max > 1.0 {
        for v in values.iter_mut() {
            *v /= max;
        }
    }
}

impl Plot {
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.levels.len()
    }

    /// Current level of a bar in `[0, 1]`
    #[inline]
    pub fn bin_level(&self, bin: usize) -> SignalStrength {
        self.levels[bin]
    }

    /// Current level of a bar's peak marker in `[0, 1]`
    #[inline]
    pub fn hat_level(&self, bin: usize) -> SignalStrength {
        self.hats[bin]
    }

    /// Iterate over `(level, hat level)` of all bars
    pub fn bars<'a>(&'a self) -> impl Iterator<Item = (SignalStrength, SignalStrength)> + 'a {
        self.levels.iter().cloned().zip(self.hats.iter().cloned())
    }

    /// Position of a bar along the frequency distribution, for coloring
    pub fn bin_position(&self, bin: usize) -> f32 {
        if self.num_bins() > 1 {
            (self.distribution)(bin as f32 / (self.num_bins() - 1) as f32)
        } else {
            0.0
        }
    }

    /// Range of spectrum buckets spread over the bars
    pub fn spectrum_range(&self) -> ops::RangeInclusive<usize> {
        self.spectrum_low..=self.spectrum_high
    }

    /// Runs of bars which get interpolated instead of fed from the spectrum
    pub fn missed_bins(&self) -> &[ops::Range<usize>] {
        &self.missed
    }

    /// Bar a spectrum bucket inside the frequency range is added to
    fn spectrum_bin(&self, i: usize) -> usize {
        let span = (self.spectrum_high - self.spectrum_low).max(1) as f32;
        let x = (i - self.spectrum_low) as f32 / span;
        let bin = ((self.num_bins() - 1) as f32 * (self.distribution)(x)).round() as usize;

        bin.min(self.num_bins() - 1)
    }

    fn recalculate_missed(&mut self) {
        self.missed.clear();

        let mut previous = 0;
        for i in self.spectrum_low..=self.spectrum_high {
            let bin = self.spectrum_bin(i);

            if bin > previous + 1 {
                self.missed.push(previous + 1..bin);
            }

            previous = bin;
        }

        log::debug!("Plot({:p}): Missed bins = {:?}", &self, self.missed);
    }

    /// Lay out bars for a new display width
    ///
    /// Levels, peak markers and their velocities are carried over onto the new number of
    /// bars by picking the nearest old bar.
    pub fn recalculate_geometry(&mut self, width: usize) {
        let num_bins = (width / self.bin_width).max(1);

        self.targets = resample(&self.targets, num_bins);
        self.levels = resample(&self.levels, num_bins);
        self.hats = resample(&self.hats, num_bins);
        self.velocities = resample(&self.velocities, num_bins);

        normalize(&mut self.targets);
        normalize(&mut self.levels);
        normalize(&mut self.hats);

        log::debug!("Plot({:p}):", &self);
        log::debug!("    Width               = {:8}", width);
        log::debug!("    Bins                = {:8}", num_bins);

        self.recalculate_missed();
    }

    /// Translate the frequency range into spectrum buckets
    ///
    /// Needs to be called whenever the sample rate or the spectrum size changes.
    pub fn recalculate_frequency_range(&mut self, rate: usize, spectrum_size: usize) {
        self.spectrum_size = spectrum_size;

        let nyquist = (rate / 2) as Frequency;
        if spectrum_size == 0 || nyquist <= 0.0 {
            self.spectrum_low = 0;
            self.spectrum_high = 0;
            self.missed.clear();
            return;
        }

        let low = if nyquist > self.frequency_low {
            self.frequency_low
        } else {
            0.0
        };
        let high = self.frequency_high.min(nyquist);

        let last = spectrum_size - 1;
        self.spectrum_high = ((high / nyquist * spectrum_size as f32).ceil() as usize).min(last);
        self.spectrum_low =
            ((low / nyquist * spectrum_size as f32).floor() as usize).min(self.spectrum_high);

        log::debug!("Plot({:p}):", &self);
        log::debug!("    Sample Rate         = {:8}", rate);
        log::debug!("    Spectrum Size       = {:8}", spectrum_size);
        log::debug!(
            "    Spectrum Range      = {:8} - {} ({} Hz - {} Hz)",
            self.spectrum_low,
            self.spectrum_high,
            low,
            high,
        );

        self.recalculate_missed();
    }

    /// Feed one spectrum into the bars
    ///
    /// `delta` is the time since the last update and `target` the intended frame
    /// interval.  Smoothing is scaled by their ratio so bars move at the same visual
    /// speed regardless of the refresh rate.
    pub fn update(
        &mut self,
        spectrum: &[SignalStrength],
        delta: time::Duration,
        target: time::Duration,
    ) -> crate::Result<()> {
        if spectrum.len() != self.spectrum_size || spectrum.is_empty() {
            return Err(crate::Error::SpectrumMismatch {
                expected: self.spectrum_size,
                got: spectrum.len(),
            });
        }

        let delta = delta.max(target);
        let dt = delta.as_secs_f32();
        let frame_ratio = if target > time::Duration::from_secs(0) {
            dt / target.as_secs_f32()
        } else {
            1.0
        };

        let last_bin = self.num_bins() - 1;

        for t in self.targets.iter_mut() {
            *t = 0.0;
        }

        self.targets[0] += spectrum[..self.spectrum_low].iter().sum::<SignalStrength>();

        for i in self.spectrum_low..=self.spectrum_high {
            let bin = self.spectrum_bin(i);
            self.targets[bin] += spectrum[i];
        }

        self.targets[last_bin] += spectrum[self.spectrum_high + 1..]
            .iter()
            .sum::<SignalStrength>();

        let distribution = self.distribution;
        for run in self.missed.iter() {
            let low = run.start.saturating_sub(1);
            let high = run.end.min(last_bin);

            let level_low = self.targets[low];
            let level_high = self.targets[high];

            let step = 1.0 / (run.len() + 1) as f32;

            for (k, bin) in run.clone().enumerate() {
                let x = step * (k + 1) as f32;

                // Always ease from the lower towards the higher neighbor
                let x = if level_low > level_high {
                    1.0 - distribution(1.0 - x)
                } else {
                    distribution(x)
                };

                self.targets[bin] = lerp(level_low, level_high, x);
            }
        }

        normalize(&mut self.targets);

        let follow = ((1.0 - self.smoothness) * frame_ratio).min(1.0);

        for bin in 0..self.num_bins() {
            self.levels[bin] = lerp(self.levels[bin], self.targets[bin], follow);

            if self.hats[bin] > self.levels[bin] {
                self.velocities[bin] -= self.gravity * dt;

                let next = self.hats[bin] + self.velocities[bin] * dt;
                if next > self.levels[bin] {
                    self.hats[bin] = next;
                } else {
                    // Landed
                    self.velocities[bin] = 0.0;
                    self.hats[bin] = self.levels[bin];
                }
            } else {
                self.velocities[bin] = 0.0;
                self.hats[bin] = self.levels[bin];
            }
        }

        Ok(())
    }
}

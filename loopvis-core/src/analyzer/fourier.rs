//! Fourier Analysis
use super::Sample;
use crate::analyzer;
use rustfft::num_complex::Complex;

/// Window functions
///
/// A window-function in this case takes a size and should return a `Vec` of that length filled
/// with the precomputed window coefficients.  The following are available by default:
///
/// * [Hann](fn.hann.html) (default)
/// * [None / Rectangle](fn.none.html)
/// * [Sine](fn.sine.html)
/// * [Hamming](fn.hamming.html)
/// * [Blackman](fn.blackman.html)
/// * [Nuttall](fn.nuttall.html)
/// * [Triangular](fn.triangular.html)
pub mod window {
    /// Blackman Window
    pub fn blackman(size: usize) -> Vec<f32> {
        apodize::blackman_iter(size).map(|f| f as f32).collect()
    }

    /// Hamming Window
    pub fn hamming(size: usize) -> Vec<f32> {
        apodize::hamming_iter(size).map(|f| f as f32).collect()
    }

    /// Periodic Hann Window
    ///
    /// `w[i] = 0.5 * (1 - cos(2 pi i / N))`
    pub fn hann(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
            })
            .collect()
    }

    /// No window function / Rectangle window
    pub fn none(size: usize) -> Vec<f32> {
        vec![1.0; size]
    }

    /// Nuttall Window
    pub fn nuttall(size: usize) -> Vec<f32> {
        apodize::nuttall_iter(size).map(|f| f as f32).collect()
    }

    /// Sine Window
    pub fn sine(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| (i as f32 / (size - 1) as f32 * std::f32::consts::PI).sin())
            .collect()
    }

    /// Triangular Window
    pub fn triangular(size: usize) -> Vec<f32> {
        apodize::triangular_iter(size).map(|f| f as f32).collect()
    }

    /// Get the window function for the specified name
    pub fn from_str(name: &str) -> Option<fn(usize) -> Vec<f32>> {
        match name {
            "blackman" => Some(blackman),
            "hamming" => Some(hamming),
            "hann" => Some(hann),
            "none" => Some(none),
            "nuttall" => Some(nuttall),
            "sine" => Some(sine),
            "triangular" => Some(triangular),
            _ => None,
        }
    }
}

/// Builder for FourierAnalyzer
#[derive(Debug, Default, Clone)]
pub struct FourierBuilder {
    /// Length of the fourier transform, usually the capture window size
    pub length: Option<usize>,

    /// Window Function
    ///
    /// A few window functions are defined in the [`window`](window/index.html) module.
    ///
    /// Can also be set from config as `"audio.fourier.window"`.
    pub window: Option<fn(usize) -> Vec<f32>>,

    /// Rate of the captured data
    pub rate: Option<usize>,

    /// Whether to output levels on a decibel scale
    ///
    /// Can also be set from config as `"audio.fourier.decibel"`.
    pub decibel: Option<bool>,

    /// Floor of the decibel scale, in dB
    ///
    /// Can also be set from config as `"audio.fourier.cutoff"`.
    pub cutoff: Option<analyzer::SignalStrength>,
}

impl FourierBuilder {
    /// Create a new FourierBuilder
    pub fn new() -> FourierBuilder {
        Default::default()
    }

    /// Set the length of the transform buffer
    pub fn length(&mut self, length: usize) -> &mut FourierBuilder {
        self.length = Some(length);
        self
    }

    /// Set the window function
    pub fn window(&mut self, f: fn(usize) -> Vec<f32>) -> &mut FourierBuilder {
        self.window = Some(f);
        self
    }

    /// Set the sample rate of the analyzed window
    pub fn rate(&mut self, rate: usize) -> &mut FourierBuilder {
        self.rate = Some(rate);
        self
    }

    /// Enable or disable decibel scaling
    pub fn decibel(&mut self, decibel: bool) -> &mut FourierBuilder {
        self.decibel = Some(decibel);
        self
    }

    /// Set the decibel floor
    pub fn cutoff(&mut self, cutoff: analyzer::SignalStrength) -> &mut FourierBuilder {
        self.cutoff = Some(cutoff);
        self
    }

    /// Plan the fourier transform and prepare buffers
    pub fn plan(&mut self) -> crate::Result<FourierAnalyzer> {
        let length = self.length.ok_or(crate::Error::NotInitialized)?;
        let rate = self.rate.ok_or(crate::Error::NotInitialized)?;

        let window = match self.window {
            Some(f) => f,
            None => {
                let name = crate::CONFIG.get_or("audio.fourier.window", "hann".to_string());
                window::from_str(&name).ok_or(crate::Error::UnknownWindow(name))?
            }
        };
        let decibel = self
            .decibel
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.fourier.decibel", true));
        let cutoff = self
            .cutoff
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.fourier.cutoff", -40.0));

        Ok(FourierAnalyzer::new(length, window(length), rate, decibel, cutoff))
    }
}

/// Fourier Analyzer
///
/// Turns one window of mono samples into a normalized magnitude spectrum.
///
/// # Example
/// ```
/// # use loopvis_core::analyzer::fourier::*;
/// let mut analyzer = FourierBuilder::new()
///     .length(1200)
///     .rate(48000)
///     .window(window::hann)
///     .decibel(true)
///     .cutoff(-40.0)
///     .plan()
///     .unwrap();
///
/// let spectrum = analyzer.analyze(&[0.0; 1200]).unwrap();
/// assert_eq!(spectrum.len(), 601);
/// ```
#[derive(Clone)]
pub struct FourierAnalyzer {
    length: usize,
    window: Vec<Sample>,

    decibel: bool,
    cutoff: analyzer::SignalStrength,

    fft: std::sync::Arc<dyn realfft::RealToComplex<Sample>>,

    input: Vec<Sample>,
    output: Vec<Complex<Sample>>,
    scratch: Vec<Complex<Sample>>,

    spectrum: analyzer::Spectrum,
}

impl std::fmt::Debug for FourierAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "FourierAnalyzer {{ length: {:?}, rate: {:?}, decibel: {:?}, cutoff: {:?} }}",
            self.length,
            self.spectrum.rate(),
            self.decibel,
            self.cutoff,
        )
    }
}

impl FourierAnalyzer {
    fn new(
        length: usize,
        window: Vec<f32>,
        rate: usize,
        decibel: bool,
        cutoff: analyzer::SignalStrength,
    ) -> FourierAnalyzer {
        let fft = realfft::RealFftPlanner::<Sample>::new().plan_fft_forward(length);

        let fa = FourierAnalyzer {
            length,
            window,

            decibel,
            cutoff,

            input: fft.make_input_vec(),
            output: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),

            fft,

            spectrum: analyzer::Spectrum::new(length, rate),
        };

        log::debug!("FourierAnalyzer({:p}):", &fa);
        log::debug!("    Fourier Length      = {:8}", length);
        log::debug!("    Buckets             = {:8}", fa.buckets());
        log::debug!("    Sample Rate         = {:8}", rate);
        log::debug!("    Bucket Width        = {:8.3} Hz", fa.spectrum.width());
        log::debug!("    Decibel Mode        = {:>8}", decibel);
        log::debug!("    Decibel Cutoff      = {:8.3} dB", cutoff);

        fa
    }

    /// Return the number of buckets
    #[inline]
    pub fn buckets(&self) -> usize {
        self.spectrum.len()
    }

    #[inline]
    pub fn decibel_mode(&self) -> bool {
        self.decibel
    }

    pub fn toggle_decibel_mode(&mut self) {
        self.decibel = !self.decibel;
        log::debug!("FourierAnalyzer({:p}): Decibel mode {}", &self, self.decibel);
    }

    /// Analyze one window of samples
    ///
    /// The window must have exactly the length this analyzer was planned for, a resized
    /// capture window needs a new plan.
    pub fn analyze(&mut self, samples: &[Sample]) -> crate::Result<&analyzer::Spectrum> {
        log::trace!("FourierAnalyzer({:p}): Analyzing ...", &self);

        if samples.len() != self.length {
            return Err(crate::Error::WindowMismatch {
                expected: self.length,
                got: samples.len(),
            });
        }

        for ((i, s), w) in self.input.iter_mut().zip(samples).zip(self.window.iter()) {
            *i = s * w;
        }

        self.fft
            .process_with_scratch(&mut self.input, &mut self.output, &mut self.scratch)?;

        for (s, o) in self.spectrum.iter_mut().zip(self.output.iter()) {
            *s = o.norm();
        }

        self.spectrum.normalize();

        if self.decibel {
            self.spectrum.to_decibels(self.cutoff);
        }

        Ok(&self.spectrum)
    }
}

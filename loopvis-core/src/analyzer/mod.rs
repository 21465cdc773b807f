pub mod fourier;
pub mod samples;
pub mod spectrum;

pub use self::fourier::{window, FourierAnalyzer, FourierBuilder};
pub use self::samples::{Sample, SampleWindow};
pub use self::spectrum::{Frequency, SignalStrength, Spectrum};

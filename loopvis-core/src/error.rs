//! Error Types
use crate::recorder::StreamFormat;

/// Everything that can go wrong between the audio endpoint and the plot
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No default audio device available")]
    NoDevice,

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(StreamFormat),

    #[error("Capture engine is not initialized")]
    NotInitialized,

    /// A single packet pull or release failed, the next tick may succeed
    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Window holds {got} samples but the transform was planned for {expected}")]
    WindowMismatch { expected: usize, got: usize },

    #[error("Spectrum has {got} buckets but the plot was laid out for {expected}")]
    SpectrumMismatch { expected: usize, got: usize },

    #[error("Fourier transform failed: {0}")]
    Fft(#[from] realfft::FftError),

    #[error("Recorder type {0:?} does not exist")]
    UnknownRecorder(String),

    #[error("Window function {0:?} does not exist")]
    UnknownWindow(String),

    #[error("Frequency distribution {0:?} does not exist")]
    UnknownDistribution(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "cpalrecord")]
    #[error("{0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[cfg(feature = "cpalrecord")]
    #[error("{0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpalrecord")]
    #[error("{0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpalrecord")]
    #[error("{0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

impl Error {
    /// Whether the pipeline stays initialized after this error
    ///
    /// Transient errors only cost the current tick, everything else needs an explicit
    /// reinitialization.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Capture(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

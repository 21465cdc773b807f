//! Negotiated stream format
use std::fmt;

/// How the bits of one sample are to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Float,
    Signed,
    Unsigned,
}

/// Format of an audio endpoint, as reported when the session is opened
///
/// Samples are always delivered interleaved, one frame holding `channels` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub valid_bits_per_sample: u16,
    pub encoding: Encoding,
}

impl StreamFormat {
    /// The only format the capture engine accepts: 32 bit float
    pub fn float(sample_rate: u32, channels: u16) -> StreamFormat {
        StreamFormat {
            sample_rate,
            channels,
            bits_per_sample: 32,
            valid_bits_per_sample: 32,
            encoding: Encoding::Float,
        }
    }

    /// Size of a single sample of a single channel in bytes
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Check this format against the supported profile
    pub fn validate(&self) -> crate::Result<()> {
        let supported = self.encoding == Encoding::Float
            && self.bits_per_sample == 32
            && self.valid_bits_per_sample == 32
            && self.channels > 0
            && self.sample_rate > 0;

        if supported {
            Ok(())
        } else {
            Err(crate::Error::UnsupportedFormat(self.clone()))
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} {}/{} bit, {} ch @ {} Hz",
            self.encoding,
            self.valid_bits_per_sample,
            self.bits_per_sample,
            self.channels,
            self.sample_rate,
        )
    }
}

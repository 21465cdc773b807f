use crate::analyzer::FourierBuilder;
use crate::capture::CaptureEngine;
use crate::plot::PlotBuilder;
use crate::recorder::{self, Backend};
use std::time;

/// Puts capture, transform and plot together
///
/// Everything left unset falls back to the config.
#[derive(Debug, Default)]
pub struct Visualizer {
    pub backend: Option<Box<dyn Backend>>,
    pub recorder: recorder::RecorderBuilder,
    pub fourier: FourierBuilder,
    pub plot: PlotBuilder,

    /// Length of the analyzed window, `"audio.window_ms"` in the config
    pub window_duration: Option<time::Duration>,
    /// Display width in pixels, `"display.width"` in the config
    pub width: Option<usize>,
    /// Frames per second, `"display.refresh_rate"` in the config
    pub refresh_rate: Option<f32>,
    /// Back-off between recovery attempts, `"audio.device_poll_ms"` in the config
    pub retry_interval: Option<time::Duration>,
}

impl Visualizer {
    pub fn new() -> Visualizer {
        Default::default()
    }

    /// Use an already built backend instead of the configured recorder
    pub fn backend(mut self, backend: Box<dyn Backend>) -> Visualizer {
        self.backend = Some(backend);
        self
    }

    pub fn recorder(mut self, recorder: recorder::RecorderBuilder) -> Visualizer {
        self.recorder = recorder;
        self
    }

    pub fn fourier(mut self, fourier: FourierBuilder) -> Visualizer {
        self.fourier = fourier;
        self
    }

    pub fn plot(mut self, plot: PlotBuilder) -> Visualizer {
        self.plot = plot;
        self
    }

    pub fn window_duration(mut self, duration: time::Duration) -> Visualizer {
        self.window_duration = Some(duration);
        self
    }

    pub fn width(mut self, width: usize) -> Visualizer {
        self.width = Some(width);
        self
    }

    pub fn refresh_rate(mut self, rate: f32) -> Visualizer {
        self.refresh_rate = Some(rate);
        self
    }

    pub fn retry_interval(mut self, interval: time::Duration) -> Visualizer {
        self.retry_interval = Some(interval);
        self
    }

    /// Bind to the default device and build the tick driver
    pub fn frames(mut self) -> crate::Result<crate::Frames> {
        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => self.recorder.build()?,
        };
        let window_duration = self.window_duration.unwrap_or_else(|| {
            time::Duration::from_millis(crate::CONFIG.get_or("audio.window_ms", 25))
        });
        let width = self
            .width
            .unwrap_or_else(|| crate::CONFIG.get_or("display.width", 1280));
        let refresh_rate = self
            .refresh_rate
            .unwrap_or_else(|| crate::CONFIG.get_or("display.refresh_rate", 60.0))
            .max(1.0);

        let target = time::Duration::from_nanos((1e9 / refresh_rate as f64).round() as u64);

        log::debug!("Visualizer:");
        log::debug!("    Window Duration     = {:?}", window_duration);
        log::debug!("    Display Width       = {:8}", width);
        log::debug!("    Target Interval     = {:?}", target);

        let capture = CaptureEngine::new(backend, window_duration)?;
        let plot = self.plot.build()?;

        let mut frames = crate::Frames::new(capture, self.fourier, plot, width, target)?;

        let retry_interval = self.retry_interval.unwrap_or_else(|| {
            time::Duration::from_millis(crate::CONFIG.get_or("audio.device_poll_ms", 500))
        });
        frames.set_retry_interval(retry_interval);

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::window;
    use crate::plot::distribution;
    use crate::recorder::testing::Script;
    use crate::recorder::StreamFormat;

    #[test]
    fn test_frames() {
        let script = Script::new(StreamFormat::float(48000, 2));

        let mut fourier = FourierBuilder::new();
        fourier.window(window::hann).decibel(true).cutoff(-40.0);
        let mut plot = PlotBuilder::new();
        plot.frequency_range(20.0, 20000.0)
            .distribution(distribution::ease_out_exp)
            .smoothness(0.96)
            .gravity(0.75)
            .bin_width(16);

        let mut frames = Visualizer::new()
            .backend(script.backend())
            .fourier(fourier)
            .plot(plot)
            .window_duration(time::Duration::from_millis(25))
            .width(1280)
            .refresh_rate(50.0)
            .retry_interval(time::Duration::from_millis(250))
            .frames()
            .unwrap();

        assert_eq!(frames.capture().window_size(), Some(1200));
        assert_eq!(frames.plot().num_bins(), 80);
        assert_eq!(frames.plot().spectrum_range(), 0..=501);
        assert_eq!(frames.target_interval(), time::Duration::from_millis(20));

        script.packet(vec![0.5; 2400]);
        assert!(frames.next_frame().unwrap().updated);
    }

    #[test]
    fn test_unsupported_device() {
        let script = Script::new(StreamFormat {
            bits_per_sample: 24,
            valid_bits_per_sample: 24,
            ..StreamFormat::float(48000, 2)
        });

        match Visualizer::new()
            .backend(script.backend())
            .window_duration(time::Duration::from_millis(25))
            .width(1280)
            .refresh_rate(60.0)
            .frames()
        {
            Err(crate::Error::UnsupportedFormat(_)) => (),
            r => panic!("Unexpected result {:?}", r),
        }
    }
}

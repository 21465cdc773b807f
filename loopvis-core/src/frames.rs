//! Tick driver
//!
//! One tick runs the whole pipeline synchronously: device change handling, capture,
//! transform and plot update, in that order.
use crate::analyzer::{FourierAnalyzer, FourierBuilder};
use crate::capture::CaptureEngine;
use crate::plot::Plot;
use std::time;

/// Default minimum time between two attempts to bring a torn down pipeline back
const RETRY_INTERVAL: time::Duration = time::Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds since the frames were created
    pub time: f32,
    pub frame: usize,
    /// Whether the plot got new data this frame
    pub updated: bool,
}

#[derive(Debug)]
pub struct Frames {
    capture: CaptureEngine,
    fourier: FourierBuilder,
    analyzer: Option<FourierAnalyzer>,
    plot: Plot,
    target: time::Duration,

    retry_interval: time::Duration,
    last_retry: Option<time::Instant>,

    start: time::Instant,
    last: time::Instant,
    frame: usize,
}

impl Frames {
    /// Lay out the plot and plan the transform for the current capture session
    pub fn new(
        capture: CaptureEngine,
        fourier: FourierBuilder,
        mut plot: Plot,
        width: usize,
        target: time::Duration,
    ) -> crate::Result<Frames> {
        plot.recalculate_geometry(width);

        let now = time::Instant::now();
        let mut frames = Frames {
            capture,
            fourier,
            analyzer: None,
            plot,
            target,

            retry_interval: RETRY_INTERVAL,
            last_retry: None,

            start: now,
            last: now,
            frame: 0,
        };
        frames.replan()?;

        Ok(frames)
    }

    /// Plan a transform matching the capture window and lay the spectrum onto the plot
    fn replan(&mut self) -> crate::Result<()> {
        self.analyzer = None;

        let length = self
            .capture
            .window_size()
            .ok_or(crate::Error::NotInitialized)?;
        let rate = self
            .capture
            .format()
            .ok_or(crate::Error::NotInitialized)?
            .sample_rate as usize;

        let analyzer = self.fourier.clone().length(length).rate(rate).plan()?;
        self.fourier.decibel(analyzer.decibel_mode());

        self.plot.recalculate_frequency_range(rate, analyzer.buckets());
        self.analyzer = Some(analyzer);

        Ok(())
    }

    /// Tear down and rebuild capture session, transform plan and frequency range
    ///
    /// On failure the pipeline stays torn down and every tick reports
    /// [`Error::NotInitialized`](../enum.Error.html) until this succeeds.
    pub fn reinitialize(&mut self) -> crate::Result<()> {
        self.analyzer = None;

        self.capture.reinitialize_device()?;
        self.replan()
    }

    /// Minimum time between two attempts of [`recover`](#method.recover)
    pub fn set_retry_interval(&mut self, interval: time::Duration) {
        self.retry_interval = interval;
    }

    /// Reinitialize, but at most once per retry interval
    ///
    /// Returns whether an attempt was made.
    pub fn recover(&mut self) -> crate::Result<bool> {
        let now = time::Instant::now();

        if let Some(last) = self.last_retry {
            if now - last < self.retry_interval {
                return Ok(false);
            }
        }

        self.last_retry = Some(now);
        self.reinitialize()?;
        self.last_retry = None;

        Ok(true)
    }

    /// Run the pipeline once
    ///
    /// Returns whether the plot was updated.  A transient capture failure skips the
    /// update and leaves the last plot state in place.
    pub fn tick(&mut self, delta: time::Duration) -> crate::Result<bool> {
        if self.capture.did_default_device_change() {
            log::info!("Default audio device changed, reinitializing ...");
            self.reinitialize()?;
        }

        if self.analyzer.is_none() {
            return Err(crate::Error::NotInitialized);
        }

        match self.capture.capture() {
            Ok(()) => (),
            Err(e) if e.is_transient() => {
                log::warn!("Skipping frame {}: {}", self.frame, e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        let analyzer = self.analyzer.as_mut().ok_or(crate::Error::NotInitialized)?;
        let spectrum = analyzer.analyze(self.capture.window()?)?;

        self.plot.update(spectrum.as_slice(), delta, self.target)?;

        log::trace!("Frame {}: {:?}", self.frame, delta);

        Ok(true)
    }

    /// Advance to the next frame, ticking with the time elapsed since the last one
    pub fn next_frame(&mut self) -> crate::Result<Frame> {
        let now = time::Instant::now();
        let delta = now - self.last;
        self.last = now;

        let updated = self.tick(delta)?;

        let frame = self.frame;
        self.frame += 1;

        Ok(Frame {
            time: crate::helpers::time(self.start),
            frame,
            updated,
        })
    }

    /// Adapt the number of bars to a new display width
    pub fn resize(&mut self, width: usize) {
        self.plot.recalculate_geometry(width);
    }

    /// Switch between linear and decibel scaled spectra
    ///
    /// Also works while torn down, the next plan picks the mode up.
    pub fn toggle_decibel_mode(&mut self) {
        let decibel = !self.decibel_mode();
        self.fourier.decibel(decibel);

        if let Some(analyzer) = self.analyzer.as_mut() {
            analyzer.toggle_decibel_mode();
        }
    }

    pub fn decibel_mode(&self) -> bool {
        match &self.analyzer {
            Some(analyzer) => analyzer.decibel_mode(),
            // Resolved by the first plan
            None => self.fourier.decibel.unwrap_or(true),
        }
    }

    #[inline]
    pub fn plot(&self) -> &Plot {
        &self.plot
    }

    #[inline]
    pub fn capture(&self) -> &CaptureEngine {
        &self.capture
    }

    /// Intended time between two frames
    #[inline]
    pub fn target_interval(&self) -> time::Duration {
        self.target
    }
}

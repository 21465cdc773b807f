//! Capture Engine
//!
//! Drains the packets of the current recorder session once per tick, mixes them down
//! to mono and keeps the latest window of samples ready for the analyzer.
use crate::analyzer::{Sample, SampleWindow};
use crate::recorder::{Backend, DeviceChange, Recorder, StreamFormat};
use std::time;

#[derive(Debug)]
struct Session {
    recorder: Box<dyn Recorder>,
    format: StreamFormat,
    window: SampleWindow,
    /// Frames in the most recent packet, used to pad silence on idle ticks
    last_packet_frames: usize,
    scratch: Vec<f32>,
}

/// Number of mono samples in a window of `duration`
pub fn window_size(duration: time::Duration, format: &StreamFormat) -> usize {
    let bytes = format.bytes_per_sample();
    let window_bytes =
        (duration.as_secs_f64() * format.sample_rate as f64 * bytes as f64).ceil() as usize;

    window_bytes / bytes
}

#[derive(Debug)]
pub struct CaptureEngine {
    backend: Box<dyn Backend>,
    device_change: DeviceChange,
    window_duration: time::Duration,
    session: Option<Session>,
}

impl CaptureEngine {
    /// Subscribe to device changes and bind to the default device
    ///
    /// Fails if no session with a supported format can be opened.
    pub fn new(
        mut backend: Box<dyn Backend>,
        window_duration: time::Duration,
    ) -> crate::Result<CaptureEngine> {
        let device_change = DeviceChange::new();
        backend.subscribe(device_change.clone())?;

        let mut engine = CaptureEngine {
            backend,
            device_change,
            window_duration,
            session: None,
        };
        engine.reinitialize_device()?;

        Ok(engine)
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Handle which platform code raises on a default device change
    pub fn device_change(&self) -> DeviceChange {
        self.device_change.clone()
    }

    /// Whether the default device changed since the last call
    pub fn did_default_device_change(&self) -> bool {
        self.device_change.take()
    }

    /// Tear down the current session and bind to the (new) default device
    ///
    /// On failure the engine is left without a session and reports not initialized
    /// until this succeeds.
    pub fn reinitialize_device(&mut self) -> crate::Result<()> {
        // Release the old session before opening a new one
        self.session = None;

        let recorder = self.backend.open()?;
        let format = recorder.format().clone();
        format.validate()?;

        let size = window_size(self.window_duration, &format);
        if size == 0 {
            return Err(crate::Error::UnsupportedFormat(format));
        }

        log::debug!("CaptureEngine({:p}):", &self);
        log::debug!("    Format              = {}", format);
        log::debug!("    Window Duration     = {:?}", self.window_duration);
        log::debug!("    Window Size         = {:8}", size);

        self.session = Some(Session {
            recorder,
            scratch: Vec::with_capacity(size * format.channels as usize),
            format,
            window: SampleWindow::new(size),
            last_packet_frames: 0,
        });

        Ok(())
    }

    /// Drain every pending packet into the window
    ///
    /// When nothing is pending, as many silent samples as the last packet had frames are
    /// pushed instead so the window keeps moving while the output is idle.  An error
    /// leaves the session in place, the next call retries.
    pub fn capture(&mut self) -> crate::Result<()> {
        let Session {
            recorder,
            format,
            window,
            last_packet_frames,
            scratch,
        } = self.session.as_mut().ok_or(crate::Error::NotInitialized)?;

        let channels = format.channels as usize;

        let mut pending = recorder.next_packet_size()?;

        if pending == 0 {
            log::trace!("No packet pending, padding {} frames", last_packet_frames);
            for _ in 0..*last_packet_frames {
                window.push(0.0);
            }
        }

        while pending > 0 {
            scratch.clear();
            let frames = recorder.read_packet(scratch)?;
            *last_packet_frames = frames;

            window.extend(
                scratch
                    .chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<Sample>() / channels as Sample),
            );

            pending = recorder.next_packet_size()?;
        }

        Ok(())
    }

    /// The latest window of mono samples
    pub fn window(&self) -> crate::Result<&[Sample]> {
        self.session
            .as_ref()
            .map(|s| s.window.samples())
            .ok_or(crate::Error::NotInitialized)
    }

    /// Number of samples in a window, `None` while torn down
    pub fn window_size(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.window.len())
    }

    pub fn format(&self) -> Option<&StreamFormat> {
        self.session.as_ref().map(|s| &s.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::testing::Script;
    use crate::recorder::Encoding;

    const WINDOW: time::Duration = time::Duration::from_millis(1);

    fn engine(format: StreamFormat) -> (Script, CaptureEngine) {
        let script = Script::new(format);
        let engine = CaptureEngine::new(script.backend(), WINDOW).unwrap();
        (script, engine)
    }

    #[test]
    fn test_window_size() {
        let format = StreamFormat::float(48000, 2);

        assert_eq!(window_size(time::Duration::from_millis(25), &format), 1200);
        assert_eq!(window_size(time::Duration::from_millis(1), &format), 48);
        assert_eq!(
            window_size(time::Duration::from_millis(25), &StreamFormat::float(44100, 2)),
            1102,
        );
    }

    #[test]
    fn test_downmix() {
        let (script, mut engine) = engine(StreamFormat::float(8000, 2));
        assert_eq!(engine.window_size(), Some(8));

        script.packet(vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0]);
        script.packet(vec![0.25, 0.75]);
        engine.capture().unwrap();

        assert_eq!(
            engine.window().unwrap(),
            &[0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.5]
        );
    }

    #[test]
    fn test_silence_padding() {
        let (script, mut engine) = engine(StreamFormat::float(8000, 1));

        // Nothing seen yet, so nothing to pad
        engine.capture().unwrap();
        assert_eq!(engine.window().unwrap(), &[0.0; 8]);

        script.packet(vec![1.0; 5]);
        script.packet(vec![2.0; 3]);
        engine.capture().unwrap();
        assert_eq!(
            engine.window().unwrap(),
            &[1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]
        );

        // Only the last packet's size counts
        engine.capture().unwrap();
        assert_eq!(
            engine.window().unwrap(),
            &[1.0, 1.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0]
        );

        engine.capture().unwrap();
        engine.capture().unwrap();
        assert_eq!(engine.window().unwrap(), &[0.0; 8]);
    }

    #[test]
    fn test_transient_failure() {
        let (script, mut engine) = engine(StreamFormat::float(8000, 1));

        script.packet(vec![1.0; 2]);
        script.failure("buffer error");
        script.packet(vec![3.0; 2]);

        let err = engine.capture().unwrap_err();
        assert!(err.is_transient());
        assert!(engine.is_initialized());

        engine.capture().unwrap();
        assert_eq!(
            engine.window().unwrap(),
            &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 3.0, 3.0]
        );
    }

    #[test]
    fn test_unsupported_format() {
        let int = StreamFormat {
            bits_per_sample: 16,
            valid_bits_per_sample: 16,
            encoding: Encoding::Signed,
            ..StreamFormat::float(48000, 2)
        };
        let script = Script::new(int);

        match CaptureEngine::new(script.backend(), WINDOW) {
            Err(crate::Error::UnsupportedFormat(f)) => assert_eq!(f.bits_per_sample, 16),
            r => panic!("Unexpected result {:?}", r.map(|e| e.window_size())),
        }
    }

    #[test]
    fn test_reinitialize() {
        let (script, mut engine) = engine(StreamFormat::float(8000, 2));

        script.packet(vec![1.0; 4]);
        engine.capture().unwrap();

        script.next_format(StreamFormat::float(16000, 1));
        engine.reinitialize_device().unwrap();

        assert_eq!(script.opened(), 2);
        assert_eq!(engine.window_size(), Some(16));
        assert_eq!(engine.format().unwrap().channels, 1);
        assert_eq!(engine.window().unwrap(), &[0.0; 16]);

        // The silence heuristic starts over with the new session
        engine.capture().unwrap();
        assert_eq!(engine.window().unwrap(), &[0.0; 16]);
    }

    #[test]
    fn test_failed_reinitialize_tears_down() {
        let (script, mut engine) = engine(StreamFormat::float(8000, 2));

        script.refuse_open(true);
        assert!(engine.reinitialize_device().is_err());
        assert!(!engine.is_initialized());
        assert!(engine.window().is_err());
        match engine.capture() {
            Err(crate::Error::NotInitialized) => (),
            r => panic!("Unexpected result {:?}", r),
        }

        script.refuse_open(false);
        engine.reinitialize_device().unwrap();
        assert!(engine.is_initialized());
        engine.capture().unwrap();
    }

    #[test]
    fn test_device_change_flag() {
        let (script, engine) = engine(StreamFormat::float(8000, 2));

        assert!(!engine.did_default_device_change());

        script.change_device();
        assert!(engine.did_default_device_change());
        assert!(!engine.did_default_device_change());
    }
}

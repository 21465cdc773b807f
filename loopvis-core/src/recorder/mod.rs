#[cfg(feature = "cpalrecord")]
pub mod cpal;

pub mod format;

#[cfg(test)]
pub(crate) mod testing;

pub use self::format::{Encoding, StreamFormat};

use std::sync::atomic;
use std::sync::Arc;

/// One open session on an audio endpoint
///
/// The session owns every platform handle it needs and releases them when dropped.
/// Audio arrives in packets of interleaved frames which are queued by the platform
/// until they are drained.
pub trait Recorder: std::fmt::Debug {
    /// Format negotiated when this session was opened
    fn format(&self) -> &StreamFormat;

    /// Number of frames in the next queued packet, `0` if nothing is pending
    ///
    /// Never blocks waiting for audio.
    fn next_packet_size(&mut self) -> crate::Result<usize>;

    /// Pop the next packet and append its interleaved samples to `buf`
    ///
    /// Returns the number of frames appended.
    fn read_packet(&mut self, buf: &mut Vec<f32>) -> crate::Result<usize>;
}

/// Platform binding which opens sessions on the default output device
pub trait Backend: std::fmt::Debug {
    /// Register the handle to raise whenever the default device changes
    fn subscribe(&mut self, notify: DeviceChange) -> crate::Result<()>;

    /// Open a new session on the current default device
    fn open(&mut self) -> crate::Result<Box<dyn Recorder>>;
}

/// Edge triggered "default device changed" flag
///
/// Raised from platform threads, consumed once per tick on the main thread.
#[derive(Debug, Clone, Default)]
pub struct DeviceChange(Arc<atomic::AtomicBool>);

impl DeviceChange {
    pub fn new() -> DeviceChange {
        Default::default()
    }

    pub fn notify(&self) {
        self.0.store(true, atomic::Ordering::Release);
    }

    /// Read and clear the flag
    pub fn take(&self) -> bool {
        self.0.swap(false, atomic::Ordering::AcqRel)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecorderBuilder {
    pub recorder: Option<String>,
    pub poll_interval: Option<std::time::Duration>,
}

impl RecorderBuilder {
    pub fn new() -> RecorderBuilder {
        Default::default()
    }

    pub fn recorder<S: Into<String>>(&mut self, rec: S) -> &mut RecorderBuilder {
        self.recorder = Some(rec.into());
        self
    }

    /// How often to look for a new default device
    pub fn poll_interval(&mut self, interval: std::time::Duration) -> &mut RecorderBuilder {
        self.poll_interval = Some(interval);
        self
    }

    pub fn build(&mut self) -> crate::Result<Box<dyn Backend>> {
        let recorder = self
            .recorder
            .clone()
            .unwrap_or_else(|| crate::CONFIG.get_or("audio.recorder", "cpal".to_string()));
        let poll_interval = self.poll_interval.unwrap_or_else(|| {
            std::time::Duration::from_millis(crate::CONFIG.get_or("audio.device_poll_ms", 500))
        });

        match &*recorder {
            #[cfg(feature = "cpalrecord")]
            "cpal" => Ok(Box::new(self::cpal::CPalBackend::new(poll_interval))),

            _ => {
                log::trace!("Device poll interval {:?} unused", poll_interval);
                Err(crate::Error::UnknownRecorder(recorder))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_change_edge() {
        let change = DeviceChange::new();
        assert!(!change.take());

        change.clone().notify();
        assert!(change.take());
        assert!(!change.take());

        change.notify();
        change.notify();
        assert!(change.take());
        assert!(!change.take());
    }

    #[test]
    fn test_device_change_across_threads() {
        let change = DeviceChange::new();

        let remote = change.clone();
        std::thread::spawn(move || remote.notify()).join().unwrap();

        assert!(change.take());
        assert!(!change.take());
    }

    #[test]
    fn test_unknown_recorder() {
        let err = RecorderBuilder::new()
            .recorder("jack")
            .poll_interval(std::time::Duration::from_millis(10))
            .build()
            .unwrap_err();

        match err {
            crate::Error::UnknownRecorder(name) => assert_eq!(name, "jack"),
            e => panic!("Unexpected error {}", e),
        }
    }
}

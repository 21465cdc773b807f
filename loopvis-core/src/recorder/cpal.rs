//! Loopback recording through cpal
//!
//! On Windows the default output device is opened in WASAPI loopback mode.  Other hosts
//! cannot record from an output device, there the default input device is used instead
//! (usually the monitor source of the sound server).
use super::{DeviceChange, Encoding, StreamFormat};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections;
use std::sync::{self, atomic};
use std::{thread, time};

/// Packets queued beyond this depth push out the oldest one
const MAX_PENDING_PACKETS: usize = 64;

#[derive(Debug)]
struct PacketQueue {
    channels: usize,
    filled: collections::VecDeque<Vec<f32>>,
    spare: Vec<Vec<f32>>,
    failure: Option<String>,
}

impl PacketQueue {
    fn new(channels: usize) -> PacketQueue {
        PacketQueue {
            channels: channels.max(1),
            filled: collections::VecDeque::new(),
            spare: Vec::new(),
            failure: None,
        }
    }

    /// Queue the whole frames of a callback buffer
    ///
    /// Buffers holding less than one frame are dropped, a queued packet always has at
    /// least one frame.
    fn push(&mut self, data: &[f32]) {
        let frames = data.len() / self.channels;
        if frames == 0 {
            log::trace!("Dropping packet of {} samples", data.len());
            return;
        }

        let mut packet = if self.filled.len() >= MAX_PENDING_PACKETS {
            log::trace!("Packet queue full, dropping oldest packet");
            self.filled.pop_front()
        } else {
            self.spare.pop()
        }
        .unwrap_or_default();

        packet.clear();
        packet.extend_from_slice(&data[..frames * self.channels]);
        self.filled.push_back(packet);
    }

    /// Record a stream error, reported once by the next size query
    fn fail(&mut self, failure: String) {
        self.failure = Some(failure);
    }

    fn next_packet_size(&mut self) -> crate::Result<usize> {
        if let Some(failure) = self.failure.take() {
            return Err(crate::Error::Capture(failure));
        }

        Ok(self
            .filled
            .front()
            .map(|p| p.len() / self.channels)
            .unwrap_or(0))
    }

    fn read_packet(&mut self, buf: &mut Vec<f32>) -> usize {
        match self.filled.pop_front() {
            Some(packet) => {
                buf.extend_from_slice(&packet);
                let frames = packet.len() / self.channels;
                self.spare.push(packet);
                frames
            }
            None => 0,
        }
    }
}

type SharedQueue = sync::Arc<parking_lot::Mutex<PacketQueue>>;

fn default_device(host: &cpal::Host) -> Option<cpal::Device> {
    if cfg!(target_os = "windows") {
        host.default_output_device()
    } else {
        host.default_input_device()
    }
}

fn default_device_name(host: &cpal::Host) -> Option<String> {
    default_device(host).and_then(|d| d.name().ok())
}

fn stream_format(config: &cpal::SupportedStreamConfig) -> StreamFormat {
    let sample_format = config.sample_format();
    let bits = (sample_format.sample_size() * 8) as u16;

    let encoding = if sample_format.is_float() {
        Encoding::Float
    } else if sample_format.is_uint() {
        Encoding::Unsigned
    } else {
        Encoding::Signed
    };

    StreamFormat {
        sample_rate: config.sample_rate().0,
        channels: config.channels(),
        bits_per_sample: bits,
        valid_bits_per_sample: bits,
        encoding,
    }
}

#[derive(Debug)]
struct Watcher {
    stop: sync::Arc<atomic::AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop.store(true, atomic::Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Device watcher panicked");
            }
        }
    }
}

/// Opens loopback sessions on the default device and watches for device changes
#[derive(Debug)]
pub struct CPalBackend {
    poll_interval: time::Duration,
    notify: DeviceChange,
    watcher: Option<Watcher>,
}

impl CPalBackend {
    pub fn new(poll_interval: time::Duration) -> CPalBackend {
        CPalBackend {
            poll_interval,
            notify: DeviceChange::new(),
            watcher: None,
        }
    }
}

impl super::Backend for CPalBackend {
    fn subscribe(&mut self, notify: DeviceChange) -> crate::Result<()> {
        // Stop the previous watcher before handing out the new flag
        self.watcher = None;
        self.notify = notify.clone();

        let stop = sync::Arc::new(atomic::AtomicBool::new(false));
        let poll_interval = self.poll_interval;

        let handle = {
            let stop = stop.clone();

            thread::Builder::new()
                .name("device-watcher".into())
                .spawn(move || {
                    let host = cpal::default_host();
                    let mut current = default_device_name(&host);

                    while !stop.load(atomic::Ordering::Relaxed) {
                        thread::sleep(poll_interval);

                        let name = default_device_name(&host);
                        if name != current {
                            log::info!("Default device changed: {:?} -> {:?}", current, name);
                            current = name;
                            notify.notify();
                        }
                    }
                })?
        };

        self.watcher = Some(Watcher {
            stop,
            handle: Some(handle),
        });

        Ok(())
    }

    fn open(&mut self) -> crate::Result<Box<dyn super::Recorder>> {
        Ok(Box::new(CPalRecorder::new(self.notify.clone())?))
    }
}

/// One loopback session
///
/// Fields drop in declaration order, so the stream is stopped before the device
/// handle goes away.
pub struct CPalRecorder {
    _stream: cpal::Stream,
    queue: SharedQueue,
    format: StreamFormat,
    device: cpal::Device,
}

impl std::fmt::Debug for CPalRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "CPalRecorder {{ device: {:?}, format: {} }}",
            self.device.name().unwrap_or_default(),
            self.format,
        )
    }
}

impl CPalRecorder {
    fn new(notify: DeviceChange) -> crate::Result<CPalRecorder> {
        let host = cpal::default_host();
        let device = default_device(&host).ok_or(crate::Error::NoDevice)?;

        let config = if cfg!(target_os = "windows") {
            device.default_output_config()?
        } else {
            device.default_input_config()?
        };

        let format = stream_format(&config);
        format.validate()?;

        let queue: SharedQueue = sync::Arc::new(parking_lot::Mutex::new(PacketQueue::new(
            format.channels as usize,
        )));

        let stream = {
            let data_queue = queue.clone();
            let error_queue = queue.clone();

            device.build_input_stream(
                &config.config(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| data_queue.lock().push(data),
                move |err| match err {
                    cpal::StreamError::DeviceNotAvailable => {
                        log::info!("Capture device went away");
                        notify.notify();
                    }
                    other => error_queue.lock().fail(other.to_string()),
                },
                None,
            )?
        };
        stream.play()?;

        log::debug!("CPal Recorder:");
        log::debug!("    Device      = {}", device.name()?);
        log::debug!("    Sample Rate = {:6}", format.sample_rate);
        log::debug!("    Channels    = {:6}", format.channels);

        Ok(CPalRecorder {
            _stream: stream,
            queue,
            format,
            device,
        })
    }
}

impl super::Recorder for CPalRecorder {
    fn format(&self) -> &StreamFormat {
        &self.format
    }

    fn next_packet_size(&mut self) -> crate::Result<usize> {
        self.queue.lock().next_packet_size()
    }

    fn read_packet(&mut self, buf: &mut Vec<f32>) -> crate::Result<usize> {
        Ok(self.queue.lock().read_packet(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_recycles_packets() {
        let mut queue = PacketQueue::new(2);

        queue.push(&[1.0, 2.0]);
        let mut buf = Vec::new();
        assert_eq!(queue.read_packet(&mut buf), 1);
        let ptr = queue.spare[0].as_ptr();

        queue.push(&[3.0, 4.0]);
        assert_eq!(queue.filled.front().unwrap().as_ptr(), ptr);
        assert_eq!(&queue.filled[0][..], &[3.0, 4.0]);
        assert!(queue.spare.is_empty());
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut queue = PacketQueue::new(1);

        for i in 0..MAX_PENDING_PACKETS + 10 {
            queue.push(&[i as f32]);
        }

        assert_eq!(queue.filled.len(), MAX_PENDING_PACKETS);
        assert_eq!(queue.filled.front().unwrap()[0], 10.0);
    }

    #[test]
    fn test_queue_skips_partial_frames() {
        let mut queue = PacketQueue::new(2);

        queue.push(&[]);
        queue.push(&[0.5]);
        queue.push(&[0.1, 0.2]);

        // The real packet is next in line, nothing empty blocks it
        assert_eq!(queue.next_packet_size().unwrap(), 1);
        let mut buf = Vec::new();
        assert_eq!(queue.read_packet(&mut buf), 1);
        assert_eq!(buf, vec![0.1, 0.2]);
        assert_eq!(queue.next_packet_size().unwrap(), 0);

        // Trailing samples of an incomplete frame are cut off
        queue.push(&[0.3, 0.4, 0.5]);
        buf.clear();
        assert_eq!(queue.next_packet_size().unwrap(), 1);
        assert_eq!(queue.read_packet(&mut buf), 1);
        assert_eq!(buf, vec![0.3, 0.4]);
    }

    #[test]
    fn test_queue_reports_failure_once() {
        let mut queue = PacketQueue::new(1);

        queue.push(&[0.25; 4]);
        queue.fail("buffer overrun".into());

        match queue.next_packet_size() {
            Err(e @ crate::Error::Capture(_)) => assert!(e.is_transient()),
            r => panic!("Unexpected result {:?}", r),
        }
        assert_eq!(queue.next_packet_size().unwrap(), 4);

        let mut buf = Vec::new();
        assert_eq!(queue.read_packet(&mut buf), 4);
        assert_eq!(queue.read_packet(&mut buf), 0);
        assert_eq!(buf.len(), 4);
    }
}

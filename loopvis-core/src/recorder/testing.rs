//! Scripted backend for driving the pipeline without audio hardware
use super::{DeviceChange, StreamFormat};
use std::collections;
use std::sync;

#[derive(Debug)]
enum Packet {
    Frames(Vec<f32>),
    Failure(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    packets: collections::VecDeque<Packet>,
    formats: collections::VecDeque<StreamFormat>,
    current: Option<StreamFormat>,
    refuse_open: bool,
    opened: usize,
    notify: Option<DeviceChange>,
}

/// Handle to feed a [`ScriptedBackend`] from the test body
#[derive(Debug, Clone)]
pub struct Script(sync::Arc<parking_lot::Mutex<ScriptState>>);

impl Script {
    pub fn new(format: StreamFormat) -> Script {
        let state = ScriptState {
            current: Some(format),
            ..Default::default()
        };
        Script(sync::Arc::new(parking_lot::Mutex::new(state)))
    }

    /// Queue one packet of interleaved samples
    pub fn packet(&self, samples: Vec<f32>) {
        self.0.lock().packets.push_back(Packet::Frames(samples));
    }

    /// Queue a failing packet pull
    pub fn failure(&self, msg: &str) {
        self.0.lock().packets.push_back(Packet::Failure(msg.into()));
    }

    /// Format reported by the next opened session
    pub fn next_format(&self, format: StreamFormat) {
        self.0.lock().formats.push_back(format);
    }

    pub fn refuse_open(&self, refuse: bool) {
        self.0.lock().refuse_open = refuse;
    }

    pub fn opened(&self) -> usize {
        self.0.lock().opened
    }

    /// Simulate the platform callback announcing a new default device
    pub fn change_device(&self) {
        if let Some(notify) = &self.0.lock().notify {
            notify.notify();
        }
    }

    pub fn backend(&self) -> Box<dyn super::Backend> {
        Box::new(ScriptedBackend(self.clone()))
    }
}

#[derive(Debug)]
pub struct ScriptedBackend(Script);

impl super::Backend for ScriptedBackend {
    fn subscribe(&mut self, notify: DeviceChange) -> crate::Result<()> {
        (self.0).0.lock().notify = Some(notify);
        Ok(())
    }

    fn open(&mut self) -> crate::Result<Box<dyn super::Recorder>> {
        let mut state = (self.0).0.lock();

        if state.refuse_open {
            return Err(crate::Error::NoDevice);
        }

        if let Some(format) = state.formats.pop_front() {
            state.current = Some(format);
        }
        let format = state.current.clone().ok_or(crate::Error::NoDevice)?;
        format.validate()?;

        state.opened += 1;

        Ok(Box::new(ScriptedRecorder {
            script: self.0.clone(),
            format,
        }))
    }
}

#[derive(Debug)]
pub struct ScriptedRecorder {
    script: Script,
    format: StreamFormat,
}

impl super::Recorder for ScriptedRecorder {
    fn format(&self) -> &StreamFormat {
        &self.format
    }

    fn next_packet_size(&mut self) -> crate::Result<usize> {
        let mut state = self.script.0.lock();

        let size = match state.packets.front() {
            Some(Packet::Frames(samples)) => Some(samples.len() / self.format.channels as usize),
            Some(Packet::Failure(_)) => None,
            None => Some(0),
        };

        match size {
            Some(size) => Ok(size),
            None => match state.packets.pop_front() {
                Some(Packet::Failure(msg)) => Err(crate::Error::Capture(msg)),
                _ => Ok(0),
            },
        }
    }

    fn read_packet(&mut self, buf: &mut Vec<f32>) -> crate::Result<usize> {
        let mut state = self.script.0.lock();

        match state.packets.pop_front() {
            Some(Packet::Frames(samples)) => {
                buf.extend_from_slice(&samples);
                Ok(samples.len() / self.format.channels as usize)
            }
            Some(Packet::Failure(msg)) => Err(crate::Error::Capture(msg)),
            None => Ok(0),
        }
    }
}

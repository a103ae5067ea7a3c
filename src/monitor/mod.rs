//! The MIDI monitor: acquires platform access, keeps one handler per input
//! and turns platform notifications into [`MonitorState`] transitions.
//!
//! All transitions run on the thread which owns the [`Monitor`]. Platform
//! callbacks only enqueue [`Notification`]s, which are handled one at a time
//! by [`Monitor::handle`].

use crossbeam_channel as channel;
use std::sync::{Arc, Mutex};

use crate::midi::{
    self, AccessHandle, AccessOptions, Device, DeviceId, MessageCallback, MidiPlatform, PortChange,
};

pub mod state;
pub use state::{Event, LogEntry, LogPolicy, MessageLog, MonitorState, Status};

pub mod subscription;
pub use subscription::Subscriptions;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Subscription(#[from] subscription::Error),
}

#[derive(Debug)]
pub struct Incoming {
    pub device: DeviceId,
    pub ts: u64,
    pub buffer: Vec<u8>,
}

#[derive(Debug)]
pub enum Notification {
    StateChange(PortChange),
    Message(Incoming),
}

pub struct Monitor<P: MidiPlatform> {
    platform: P,
    handle: Option<P::Handle>,
    initialized: bool,
    subscriptions: Subscriptions,
    state: Arc<Mutex<MonitorState>>,
    notif_tx: channel::Sender<Notification>,
    notif_rx: channel::Receiver<Notification>,
}

impl<P: MidiPlatform> Monitor<P> {
    pub fn new(platform: P, state: Arc<Mutex<MonitorState>>) -> Self {
        let (notif_tx, notif_rx) = channel::unbounded();

        Self {
            platform,
            handle: None,
            initialized: false,
            subscriptions: Subscriptions::default(),
            state,
            notif_tx,
            notif_rx,
        }
    }

    pub fn notifications(&self) -> channel::Receiver<Notification> {
        self.notif_rx.clone()
    }

    #[cfg(test)]
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Requests platform access, once.
    ///
    /// Failures end up in the state, not in the result: the monitor keeps
    /// running without inputs.
    pub fn init(&mut self) -> Result<Status, Error> {
        if self.initialized {
            return Ok(Status::Unchanged);
        }
        self.initialized = true;

        if !self.platform.is_supported() {
            log::warn!("Midi access is not supported on this platform");
            return Ok(self.apply(Event::Unsupported));
        }

        let options = AccessOptions { sysex: true };
        let mut handle = match self.platform.request_access(options) {
            Ok(handle) => handle,
            Err(err) => {
                log::error!("Midi access failed: {}", err);
                return Ok(self.apply(Event::AccessFailed {
                    reason: err.to_string(),
                }));
            }
        };

        let notif_tx = self.notif_tx.clone();
        handle.on_state_change(Box::new(move |change| {
            if notif_tx.send(Notification::StateChange(change)).is_err() {
                log::debug!("Dropping port change: monitor is gone");
            }
        }));

        let inputs = handle.inputs();
        let res = self.subscribe(&mut handle, &inputs);
        self.handle = Some(handle);

        let status = self.apply(Event::AccessGranted {
            unmonitored: self.unmonitored(&inputs),
            inputs,
            sysex: options.sysex,
        });
        res.map(|()| status)
    }

    pub fn handle(&mut self, notification: Notification) -> Result<Status, Error> {
        match notification {
            Notification::StateChange(change) => self.devices_changed(change),
            Notification::Message(incoming) => Ok(self.message(incoming)),
        }
    }

    /// Handles every pending notification.
    #[cfg(test)]
    pub fn pump(&mut self) -> Result<Status, Error> {
        let mut status = Status::Unchanged;
        let notif_rx = self.notif_rx.clone();
        for notification in notif_rx.try_iter() {
            if self.handle(notification)?.was_updated() {
                status = Status::Updated;
            }
        }

        Ok(status)
    }

    pub fn apply(&self, event: Event) -> Status {
        let mut state = self.state.lock().unwrap();
        *state = std::mem::take(&mut *state).reduce(event);

        Status::Updated
    }

    /// Detaches every handler and the change callback.
    pub fn teardown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            self.subscriptions.clear(&mut handle);
            handle.clear_state_change();
            log::debug!("Midi access released");
        }
    }

    fn devices_changed(&mut self, change: PortChange) -> Result<Status, Error> {
        let mut handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                log::debug!("Ignoring {} {}: no Midi access", change.name, change.state);
                return Ok(Status::Unchanged);
            }
        };

        if change.is_input() {
            log::info!("MIDI input {} : {}", change.state, change.name);
        }

        let inputs = handle.inputs();
        let res = self.subscribe(&mut handle, &inputs);
        self.handle = Some(handle);

        let status = self.apply(Event::DevicesChanged {
            unmonitored: self.unmonitored(&inputs),
            inputs,
            change,
        });
        res.map(|()| status)
    }

    fn message(&mut self, incoming: Incoming) -> Status {
        match midi::Msg::from_midi(incoming.ts, &incoming.buffer) {
            Some(msg) => {
                log::trace!("{} from {}", msg, incoming.device);
                self.apply(Event::Message(msg))
            }
            None => Status::Unchanged,
        }
    }

    fn unmonitored(&self, inputs: &[Device]) -> Vec<DeviceId> {
        inputs
            .iter()
            .filter(|device| !self.subscriptions.is_tracked(&device.id))
            .map(|device| device.id.clone())
            .collect()
    }

    fn subscribe(&mut self, handle: &mut P::Handle, inputs: &[Device]) -> Result<(), Error> {
        let notif_tx = self.notif_tx.clone();
        self.subscriptions.sync(handle, inputs, |device| {
            message_callback(notif_tx.clone(), device.id.clone())
        })?;

        Ok(())
    }
}

impl<P: MidiPlatform> Drop for Monitor<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn message_callback(notif_tx: channel::Sender<Notification>, device: DeviceId) -> MessageCallback {
    Box::new(move |ts, buf: &[u8]| {
        let incoming = Incoming {
            device: device.clone(),
            ts,
            buffer: buf.to_vec(),
        };
        if notif_tx.send(Notification::Message(incoming)).is_err() {
            log::debug!("Dropping Midi message: monitor is gone");
        }
    })
}

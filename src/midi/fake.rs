//! In-memory platform used to drive the monitor without MIDI hardware.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use super::{
    AccessHandle, AccessOptions, Device, DeviceId, Error, MessageCallback, MidiPlatform,
    PortChange, PortKind, PortState, StateChangeCallback,
};

#[derive(Default)]
struct Inner {
    inputs: Vec<Device>,
    on_state_change: Option<StateChangeCallback>,
    // A list per device so that a handler leak shows up as a duplicate
    handlers: BTreeMap<DeviceId, Vec<MessageCallback>>,
    refused: BTreeSet<DeviceId>,
    granted: Option<AccessOptions>,
}

/// Shared side of the fake platform, used by tests to simulate events.
#[derive(Clone, Default)]
pub struct FakeBus {
    inner: Arc<Mutex<Inner>>,
}

impl FakeBus {
    pub fn with_inputs(inputs: impl IntoIterator<Item = Device>) -> Self {
        let bus = Self::default();
        bus.inner.lock().unwrap().inputs.extend(inputs);
        bus
    }

    pub fn plug(&self, device: Device) {
        let change = PortChange {
            kind: PortKind::Input,
            state: PortState::Connected,
            id: device.id.clone(),
            name: device.name.clone(),
        };

        let mut inner = self.inner.lock().unwrap();
        inner.inputs.push(device);
        if let Some(callback) = inner.on_state_change.as_mut() {
            callback(change);
        }
    }

    pub fn unplug(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .inputs
            .iter()
            .position(|device| device.id.as_ref() == id)
            .expect("unknown fake device");
        let device = inner.inputs.remove(pos);

        let change = PortChange {
            kind: PortKind::Input,
            state: PortState::Disconnected,
            id: device.id,
            name: device.name,
        };
        if let Some(callback) = inner.on_state_change.as_mut() {
            callback(change);
        }
    }

    /// Makes attaching a handler to `id` fail, as a port held by another client would.
    pub fn refuse(&self, id: &str) {
        self.inner.lock().unwrap().refused.insert(id.into());
    }

    pub fn accept(&self, id: &str) {
        self.inner.lock().unwrap().refused.remove(id);
    }

    /// Fires a change notification without altering the device set.
    pub fn notify(&self, change: PortChange) {
        if let Some(callback) = self.inner.lock().unwrap().on_state_change.as_mut() {
            callback(change);
        }
    }

    /// Delivers `buf` to every handler attached to `id`, returns how many there were.
    pub fn send(&self, id: &str, ts: u64, buf: &[u8]) -> usize {
        let mut inner = self.inner.lock().unwrap();
        match inner.handlers.get_mut(id) {
            Some(handlers) => {
                handlers.iter_mut().for_each(|handler| handler(ts, buf));
                handlers.len()
            }
            None => 0,
        }
    }

    pub fn handler_count(&self, id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .handlers
            .get(id)
            .map_or(0, Vec::len)
    }

    pub fn total_handlers(&self) -> usize {
        self.inner.lock().unwrap().handlers.values().map(Vec::len).sum()
    }

    pub fn has_state_callback(&self) -> bool {
        self.inner.lock().unwrap().on_state_change.is_some()
    }

    pub fn granted(&self) -> Option<AccessOptions> {
        self.inner.lock().unwrap().granted
    }
}

type Failure = Box<dyn Fn() -> Error + Send + Sync>;

pub struct FakePlatform {
    pub supported: bool,
    failure: Option<Failure>,
    pub bus: FakeBus,
}

impl FakePlatform {
    pub fn new(bus: FakeBus) -> Self {
        Self {
            supported: true,
            failure: None,
            bus,
        }
    }

    /// Fails every access request with the error built by `failure`.
    pub fn failing(failure: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            failure: Some(Box::new(failure)),
            ..Self::new(FakeBus::default())
        }
    }

    pub fn denying(reason: &str) -> Self {
        let reason = reason.to_string();
        Self::failing(move || Error::Denied(reason.clone()))
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(FakeBus::default())
        }
    }
}

impl MidiPlatform for FakePlatform {
    type Handle = FakeHandle;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn request_access(&self, options: AccessOptions) -> Result<FakeHandle, Error> {
        if let Some(ref failure) = self.failure {
            return Err(failure());
        }

        self.bus.inner.lock().unwrap().granted = Some(options);

        Ok(FakeHandle {
            bus: self.bus.clone(),
        })
    }
}

pub struct FakeHandle {
    bus: FakeBus,
}

impl AccessHandle for FakeHandle {
    fn inputs(&self) -> Vec<Device> {
        self.bus.inner.lock().unwrap().inputs.clone()
    }

    fn on_state_change(&mut self, callback: StateChangeCallback) {
        self.bus.inner.lock().unwrap().on_state_change = Some(callback);
    }

    fn clear_state_change(&mut self) {
        self.bus.inner.lock().unwrap().on_state_change = None;
    }

    fn on_message(&mut self, device: &DeviceId, callback: MessageCallback) -> Result<(), Error> {
        let mut inner = self.bus.inner.lock().unwrap();
        if !inner.inputs.iter().any(|input| &input.id == device) {
            return Err(Error::PortNotFound(device.clone()));
        }
        if inner.refused.contains(device) {
            return Err(Error::PortConnection(device.clone()));
        }

        // Appends instead of replacing: a missing detach must stay visible
        inner
            .handlers
            .entry(device.clone())
            .or_default()
            .push(callback);

        Ok(())
    }

    fn clear_message(&mut self, device: &DeviceId) {
        self.bus.inner.lock().unwrap().handlers.remove(device);
    }
}

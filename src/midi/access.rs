//! Seams between the monitor and the platform MIDI stack.
//!
//! The monitor only talks to a [`MidiPlatform`] and the [`AccessHandle`] it
//! grants, so the native backend can be swapped for an in-memory one.

use super::{Device, DeviceId, Error, PortChange};

/// Handler attached to one input, called with the timestamp and raw bytes.
pub type MessageCallback = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// Handler called for every port added to or removed from the platform.
pub type StateChangeCallback = Box<dyn FnMut(PortChange) + Send + 'static>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessOptions {
    /// Requests raw/exclusive mode, i.e. System Exclusive messages are delivered.
    pub sysex: bool,
}

pub trait MidiPlatform {
    type Handle: AccessHandle;

    fn is_supported(&self) -> bool;

    fn request_access(&self, options: AccessOptions) -> Result<Self::Handle, Error>;
}

pub trait AccessHandle {
    /// Snapshot of the currently known inputs.
    fn inputs(&self) -> Vec<Device>;

    fn on_state_change(&mut self, callback: StateChangeCallback);

    fn clear_state_change(&mut self);

    /// Attaches `callback` to `device`, replacing any previous handler.
    fn on_message(&mut self, device: &DeviceId, callback: MessageCallback) -> Result<(), Error>;

    fn clear_message(&mut self, device: &DeviceId);
}

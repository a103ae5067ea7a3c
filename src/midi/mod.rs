pub mod access;
pub use access::{AccessHandle, AccessOptions, MessageCallback, MidiPlatform, StateChangeCallback};

#[cfg(test)]
pub mod fake;

pub mod io;
pub use io::{MidiIn, MidirHandle, MidirPlatform};

pub mod msg;
pub use msg::{Decoded, Msg};

pub mod port;
pub use port::{Device, DeviceId, DirectionalPorts, Error, PortChange, PortKind, PortState};

pub mod watcher;
pub use watcher::PortWatcher;

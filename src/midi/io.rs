use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{
    AccessHandle, AccessOptions, Device, DeviceId, DirectionalPorts, Error, MessageCallback,
    MidiPlatform, PortWatcher, StateChangeCallback,
};

pub type MidiIn = MidiIO<midir::MidiInput, midir::MidiInputConnection<()>, ()>;

pub enum MidiIO<IO: midir::MidiIO, C, D> {
    Connected(C),
    Disconnected((IO, D)),
    None,
}

impl<IO: midir::MidiIO, C, D> Default for MidiIO<IO, C, D> {
    fn default() -> Self {
        Self::None
    }
}

impl<IO: midir::MidiIO, C, D> MidiIO<IO, C, D> {
    pub fn io(&self) -> Option<&IO> {
        match self {
            Self::Disconnected((io, _d)) => Some(io),
            _ => None,
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

impl MidiIn {
    pub fn new(client_name: &str, options: AccessOptions) -> Result<Self, midir::InitError> {
        let mut midi_input = midir::MidiInput::new(client_name)?;
        midi_input.ignore(if options.sysex {
            midir::Ignore::None
        } else {
            midir::Ignore::Sysex
        });

        Ok(Self::Disconnected((midi_input, ())))
    }

    pub fn connect(
        &mut self,
        device: &DeviceId,
        port: &midir::MidiInputPort,
        client_port_name: &str,
        mut callback: MessageCallback,
    ) -> Result<(), Error> {
        self.disconnect();
        match std::mem::take(self) {
            Self::Disconnected((midi_input, _)) => {
                match midi_input.connect(
                    port,
                    client_port_name,
                    move |ts, buf, _| callback(ts, buf),
                    (),
                ) {
                    Ok(conn) => {
                        log::info!("Connected Input to {}", device);
                        *self = Self::Connected(conn);
                    }
                    Err(err) => {
                        *self = Self::Disconnected((err.into_inner(), ()));
                        let err = Error::PortConnection(device.clone());
                        log::error!("{}", err);
                        return Err(err);
                    }
                };
            }
            _ => unreachable!(),
        }

        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.is_connected() {
            match std::mem::take(self) {
                Self::Connected(conn) => {
                    let (io, _) = conn.close();
                    *self = Self::Disconnected((io, ()));
                    log::debug!("Disconnected Input");
                }
                _ => unreachable!(),
            }
        }
    }
}

/// Platform MIDI access backed by `midir`.
pub struct MidirPlatform {
    client_name: Arc<str>,
    poll_interval: Duration,
    supported: once_cell::sync::OnceCell<bool>,
}

impl MidirPlatform {
    pub fn new(client_name: impl Into<Arc<str>>, poll_interval: Duration) -> Self {
        Self {
            client_name: client_name.into(),
            poll_interval,
            supported: once_cell::sync::OnceCell::new(),
        }
    }
}

impl MidiPlatform for MidirPlatform {
    type Handle = MidirHandle;

    fn is_supported(&self) -> bool {
        *self.supported.get_or_init(|| {
            match midir::MidiInput::new(&format!("{} check", self.client_name)) {
                Ok(_) => true,
                Err(err) => {
                    log::warn!("Midi input unavailable: {}", err);
                    false
                }
            }
        })
    }

    fn request_access(&self, options: AccessOptions) -> Result<MidirHandle, Error> {
        let midi_in = MidiIn::new(&self.client_name, options)?;
        // MidiIn::new always yields a disconnected client
        let inputs = match midi_in.io() {
            Some(midi_input) => DirectionalPorts::scan(&self.client_name, midi_input),
            None => DirectionalPorts::default(),
        };
        let inputs = Arc::new(Mutex::new(inputs));

        let on_state_change = Arc::new(Mutex::new(None));
        let watcher = PortWatcher::spawn(
            self.client_name.clone(),
            self.poll_interval,
            inputs.clone(),
            on_state_change.clone(),
        )?;

        log::info!(
            "Midi access granted to {} (SysEx {})",
            self.client_name,
            if options.sysex { "enabled" } else { "disabled" },
        );

        Ok(MidirHandle {
            client_name: self.client_name.clone(),
            options,
            inputs,
            conns: BTreeMap::new(),
            on_state_change,
            watcher: Some(watcher),
        })
    }
}

pub struct MidirHandle {
    client_name: Arc<str>,
    options: AccessOptions,
    inputs: Arc<Mutex<DirectionalPorts<midir::MidiInputPort>>>,
    conns: BTreeMap<DeviceId, MidiIn>,
    on_state_change: Arc<Mutex<Option<StateChangeCallback>>>,
    watcher: Option<PortWatcher>,
}

impl AccessHandle for MidirHandle {
    fn inputs(&self) -> Vec<Device> {
        self.inputs.lock().unwrap().devices()
    }

    fn on_state_change(&mut self, callback: StateChangeCallback) {
        *self.on_state_change.lock().unwrap() = Some(callback);
    }

    fn clear_state_change(&mut self) {
        *self.on_state_change.lock().unwrap() = None;
    }

    fn on_message(&mut self, device: &DeviceId, callback: MessageCallback) -> Result<(), Error> {
        let port = self
            .inputs
            .lock()
            .unwrap()
            .get(device)
            .ok_or_else(|| Error::PortNotFound(device.clone()))?
            .clone();

        // Drop the clients of ports which went away
        {
            let inputs = self.inputs.lock().unwrap();
            self.conns.retain(|id, _| inputs.get(id).is_some());
        }

        let midi_in = match self.conns.entry(device.clone()) {
            std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(MidiIn::new(&self.client_name, self.options)?)
            }
        };

        let client_port_name = format!("{} Input", self.client_name);
        midi_in.connect(device, &port, &client_port_name, callback)
    }

    fn clear_message(&mut self, device: &DeviceId) {
        if let Some(midi_in) = self.conns.get_mut(device) {
            midi_in.disconnect();
        }
    }
}

impl Drop for MidirHandle {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.shutdown();
        }
        self.conns.values_mut().for_each(MidiIn::disconnect);
    }
}

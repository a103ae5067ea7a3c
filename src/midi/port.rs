use std::{collections::BTreeMap, fmt, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Midi initialization failed: {0}")]
    Init(#[from] midir::InitError),

    #[error("Midi port connection failed for {0}")]
    PortConnection(DeviceId),

    #[error("Invalid Midi input {0}")]
    PortNotFound(DeviceId),

    #[error("Port watcher couldn't be started: {0}")]
    Watcher(#[from] std::io::Error),

    #[cfg(test)]
    #[error("{0}")]
    Denied(String),
}

pub type DeviceId = Arc<str>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortKind {
    Input,
    Output,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortState {
    Connected,
    Disconnected,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PortState {
    pub fn as_str(&self) -> &str {
        match self {
            PortState::Connected => "connected",
            PortState::Disconnected => "disconnected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub name: Arc<str>,
    pub manufacturer: Option<Arc<str>>,
    pub state: PortState,
}

impl Device {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Device {
            id: name.clone(),
            name,
            manufacturer: None,
            state: PortState::Connected,
        }
    }

    #[cfg(test)]
    pub fn with_manufacturer(mut self, manufacturer: impl Into<Arc<str>>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }
}

/// Payload of a device change notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortChange {
    pub kind: PortKind,
    pub state: PortState,
    pub id: DeviceId,
    pub name: Arc<str>,
}

impl PortChange {
    pub fn is_input(&self) -> bool {
        self.kind == PortKind::Input
    }
}

/// Snapshot of the ports currently known to a `midir` client, by name.
pub struct DirectionalPorts<T> {
    pub map: BTreeMap<DeviceId, T>,
}

impl<T> Default for DirectionalPorts<T> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<T> DirectionalPorts<T> {
    pub fn list(&self) -> impl Iterator<Item = &DeviceId> {
        self.map.keys()
    }

    pub fn get(&self, id: &DeviceId) -> Option<&T> {
        self.map.get(id)
    }

    pub fn devices(&self) -> Vec<Device> {
        self.list().cloned().map(Device::new).collect()
    }

    /// Enumerates the ports of `midi_io`, skipping the ones owned by `client_name`.
    pub fn scan<M>(client_name: &str, midi_io: &M) -> Self
    where
        M: midir::MidiIO<Port = T>,
    {
        Self::from_named(
            client_name,
            midi_io
                .ports()
                .into_iter()
                .map(|port| (midi_io.port_name(&port), port)),
        )
    }

    /// Ports whose name can't be read are skipped: they can vanish
    /// between listing and naming.
    fn from_named<E, I>(client_name: &str, named_ports: I) -> Self
    where
        E: fmt::Display,
        I: IntoIterator<Item = (Result<String, E>, T)>,
    {
        let mut ports = Self::default();
        for (name, port) in named_ports {
            let name = match name {
                Ok(name) => name,
                Err(err) => {
                    log::debug!("Skipping Midi port: {}", err);
                    continue;
                }
            };

            if !name.starts_with(client_name) {
                #[cfg(feature = "jack")]
                let name = name.strip_prefix("Midi-Bridge:").unwrap_or(&name);

                ports.map.insert(name.into(), port);
            }
        }

        ports
    }

    /// Lists the changes turning `self` into `next`: removals first, then additions.
    pub fn changes_to<U>(&self, kind: PortKind, next: &DirectionalPorts<U>) -> Vec<PortChange> {
        let removed = self
            .list()
            .filter(|id| !next.map.contains_key(*id))
            .map(|id| (id, PortState::Disconnected));
        let added = next
            .list()
            .filter(|id| !self.map.contains_key(*id))
            .map(|id| (id, PortState::Connected));

        removed
            .chain(added)
            .map(|(id, state)| PortChange {
                kind,
                state,
                id: id.clone(),
                name: id.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(names: &[&str]) -> DirectionalPorts<()> {
        DirectionalPorts {
            map: names.iter().map(|name| (Arc::from(*name), ())).collect(),
        }
    }

    #[test]
    fn changes_report_removed_then_added() {
        let prev = ports(&["A", "B"]);
        let next = ports(&["B", "C"]);

        let changes = prev.changes_to(PortKind::Input, &next);
        assert_eq!(changes.len(), 2);

        assert_eq!(changes[0].name.as_ref(), "A");
        assert_eq!(changes[0].state, PortState::Disconnected);
        assert_eq!(changes[1].name.as_ref(), "C");
        assert_eq!(changes[1].state, PortState::Connected);
        assert!(changes.iter().all(PortChange::is_input));
    }

    #[test]
    fn unchanged_ports_report_nothing() {
        let prev = ports(&["A"]);
        assert!(prev.changes_to(PortKind::Output, &ports(&["A"])).is_empty());
    }

    #[test]
    fn devices_are_connected_and_keyed_by_name() {
        let devices = ports(&["Keys", "Pads"]).devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id.as_ref(), "Keys");
        assert_eq!(devices[0].state, PortState::Connected);
        assert!(devices[1].manufacturer.is_none());
    }

    #[test]
    fn unreadable_and_own_ports_are_skipped() {
        let named = vec![
            (Ok("Keys".to_string()), 1),
            (Err("port vanished"), 2),
            (Ok("MIDI Monitor Input".to_string()), 3),
            (Ok("Pads".to_string()), 4),
        ];

        let ports = DirectionalPorts::from_named("MIDI Monitor", named);
        let names: Vec<_> = ports.list().map(|id| id.as_ref()).collect();
        assert_eq!(names, ["Keys", "Pads"]);
        assert_eq!(ports.get(&"Pads".into()), Some(&4));
    }

    #[test]
    fn errors_keep_their_cause() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            "thread limit",
        ));
        assert_eq!(
            err.to_string(),
            "Port watcher couldn't be started: thread limit"
        );
    }

    #[test]
    fn state_display() {
        assert_eq!(PortState::Connected.to_string(), "connected");
        assert_eq!(PortState::Disconnected.to_string(), "disconnected");
    }
}

use crate::midi::{self, AccessHandle, Device, DeviceId, MessageCallback};

#[derive(Debug, thiserror::Error)]
#[error("Couldn't subscribe to {}", describe(.0))]
pub struct Error(pub Vec<(DeviceId, midi::Error)>);

fn describe(failures: &[(DeviceId, midi::Error)]) -> String {
    let ids = failures
        .iter()
        .map(|(id, _)| id.as_ref())
        .collect::<Vec<_>>();

    format!("{} input(s): {}", ids.len(), ids.join(", "))
}

/// Keeps exactly one message handler per tracked input.
#[derive(Debug, Default)]
pub struct Subscriptions {
    tracked: Vec<DeviceId>,
}

impl Subscriptions {
    #[cfg(test)]
    pub fn tracked(&self) -> &[DeviceId] {
        &self.tracked
    }

    pub fn is_tracked(&self, id: &DeviceId) -> bool {
        self.tracked.contains(id)
    }

    /// Detaches every previously tracked input, then attaches one handler
    /// built by `make_callback` to each device of `devices`.
    ///
    /// Devices which can't be attached are left untracked and reported.
    pub fn sync<H, F>(
        &mut self,
        handle: &mut H,
        devices: &[Device],
        mut make_callback: F,
    ) -> Result<(), Error>
    where
        H: AccessHandle + ?Sized,
        F: FnMut(&Device) -> MessageCallback,
    {
        self.clear(handle);

        let mut failures = Vec::new();
        for device in devices {
            if self.is_tracked(&device.id) {
                continue;
            }

            match handle.on_message(&device.id, make_callback(device)) {
                Ok(()) => self.tracked.push(device.id.clone()),
                Err(err) => {
                    log::error!("Failed to subscribe to {}: {}", device.name, err);
                    failures.push((device.id.clone(), err));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error(failures))
        }
    }

    pub fn clear<H>(&mut self, handle: &mut H)
    where
        H: AccessHandle + ?Sized,
    {
        for id in self.tracked.drain(..) {
            handle.clear_message(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::fake::{FakeBus, FakePlatform};
    use crate::midi::{AccessOptions, MidiPlatform};

    fn noop(_: &Device) -> MessageCallback {
        Box::new(|_: u64, _: &[u8]| ())
    }

    #[test]
    fn sync_twice_keeps_one_handler_per_device() {
        let bus = FakeBus::with_inputs([Device::new("A"), Device::new("B")]);
        let platform = FakePlatform::new(bus.clone());
        let mut handle = platform.request_access(AccessOptions::default()).unwrap();
        let devices = handle.inputs();

        let mut subs = Subscriptions::default();
        subs.sync(&mut handle, &devices, noop).unwrap();
        subs.sync(&mut handle, &devices, noop).unwrap();

        assert_eq!(bus.handler_count("A"), 1);
        assert_eq!(bus.handler_count("B"), 1);
        assert_eq!(subs.tracked().len(), 2);
    }

    #[test]
    fn duplicated_device_is_attached_once() {
        let bus = FakeBus::with_inputs([Device::new("A")]);
        let mut handle = FakePlatform::new(bus.clone())
            .request_access(AccessOptions::default())
            .unwrap();

        let mut subs = Subscriptions::default();
        subs.sync(&mut handle, &[Device::new("A"), Device::new("A")], noop)
            .unwrap();

        assert_eq!(bus.handler_count("A"), 1);
    }

    #[test]
    fn failed_attachment_is_reported_and_untracked() {
        let bus = FakeBus::with_inputs([Device::new("A")]);
        let mut handle = FakePlatform::new(bus.clone())
            .request_access(AccessOptions::default())
            .unwrap();

        let mut subs = Subscriptions::default();
        let err = subs
            .sync(&mut handle, &[Device::new("A"), Device::new("Ghost")], noop)
            .unwrap_err();

        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].0.as_ref(), "Ghost");
        assert_eq!(err.to_string(), "Couldn't subscribe to 1 input(s): Ghost");
        assert!(subs.is_tracked(&"A".into()));
        assert!(!subs.is_tracked(&"Ghost".into()));
    }

    #[test]
    fn clear_detaches_everything() {
        let bus = FakeBus::with_inputs([Device::new("A"), Device::new("B")]);
        let mut handle = FakePlatform::new(bus.clone())
            .request_access(AccessOptions::default())
            .unwrap();
        let devices = handle.inputs();

        let mut subs = Subscriptions::default();
        subs.sync(&mut handle, &devices, noop).unwrap();
        subs.clear(&mut handle);

        assert_eq!(bus.total_handlers(), 0);
        assert!(subs.tracked().is_empty());
    }
}

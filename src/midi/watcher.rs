use crossbeam_channel as channel;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{DirectionalPorts, Error, PortKind, StateChangeCallback};

/// Polls the platform ports and reports hot-plug events.
///
/// `midir` doesn't notify port changes, so the watcher re-enumerates
/// inputs and outputs every `interval`, updates the shared input snapshot
/// and then calls the state change callback once per added or removed port.
pub struct PortWatcher {
    shutdown_tx: channel::Sender<()>,
    thread: std::thread::JoinHandle<()>,
}

impl PortWatcher {
    /// Starts the watcher thread once its `midir` clients are up.
    pub fn spawn(
        client_name: Arc<str>,
        interval: Duration,
        inputs: Arc<Mutex<DirectionalPorts<midir::MidiInputPort>>>,
        on_state_change: Arc<Mutex<Option<StateChangeCallback>>>,
    ) -> Result<Self, Error> {
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        let setup_name = client_name.clone();
        let thread = spawn_when_ready(
            "port watcher",
            move || Clients::try_new(&setup_name),
            move |clients| {
                clients.run(client_name, interval, shutdown_rx, inputs, on_state_change)
            },
        )?;

        Ok(Self {
            shutdown_tx,
            thread,
        })
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if self.thread.join().is_err() {
            log::error!("Port watcher panicked");
        }
    }
}

/// Spawns a thread which runs `setup` then `run`, and only returns once
/// `setup` completed, handing back its error if it failed.
///
/// The state built by `setup` never leaves the thread.
fn spawn_when_ready<St, S, R>(
    name: &str,
    setup: S,
    run: R,
) -> Result<std::thread::JoinHandle<()>, Error>
where
    S: FnOnce() -> Result<St, Error> + Send + 'static,
    R: FnOnce(St) + Send + 'static,
{
    let (ready_tx, ready_rx) = channel::bounded(1);

    let thread = std::thread::Builder::new()
        .name(name.into())
        .spawn(move || match setup() {
            Ok(state) => {
                let _ = ready_tx.send(Ok(()));
                run(state);
            }
            Err(err) => {
                let _ = ready_tx.send(Err(err));
            }
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(thread),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => {
            let _ = thread.join();
            Err(Error::Watcher(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} exited during start-up", name),
            )))
        }
    }
}

struct Clients {
    midi_in: midir::MidiInput,
    midi_out: midir::MidiOutput,
}

impl Clients {
    fn try_new(client_name: &str) -> Result<Self, Error> {
        Ok(Self {
            midi_in: midir::MidiInput::new(&format!("{} watcher", client_name))?,
            midi_out: midir::MidiOutput::new(&format!("{} watcher", client_name))?,
        })
    }

    fn run(
        self,
        client_name: Arc<str>,
        interval: Duration,
        shutdown_rx: channel::Receiver<()>,
        inputs: Arc<Mutex<DirectionalPorts<midir::MidiInputPort>>>,
        on_state_change: Arc<Mutex<Option<StateChangeCallback>>>,
    ) {
        let mut outputs = DirectionalPorts::scan(&client_name, &self.midi_out);

        loop {
            match shutdown_rx.recv_timeout(interval) {
                Err(channel::RecvTimeoutError::Timeout) => (),
                _ => break,
            }

            let next_inputs = DirectionalPorts::scan(&client_name, &self.midi_in);
            let next_outputs = DirectionalPorts::scan(&client_name, &self.midi_out);

            let mut changes = {
                let mut inputs = inputs.lock().unwrap();
                let changes = inputs.changes_to(PortKind::Input, &next_inputs);
                *inputs = next_inputs;
                changes
            };
            changes.extend(outputs.changes_to(PortKind::Output, &next_outputs));
            outputs = next_outputs;

            if changes.is_empty() {
                continue;
            }

            let mut on_state_change = on_state_change.lock().unwrap();
            for change in changes {
                log::debug!("{:?} {} {}", change.kind, change.name, change.state);
                if let Some(callback) = on_state_change.as_mut() {
                    callback(change);
                }
            }
        }

        log::debug!("Shutting down port watcher");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_failure_is_returned_with_its_cause() {
        let res = spawn_when_ready(
            "failing watcher",
            || -> Result<(), Error> {
                Err(Error::Watcher(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no sequencer",
                )))
            },
            |()| panic!("must not run after a failed setup"),
        );

        let err = res.err().expect("setup failure must be reported");
        assert!(err.to_string().contains("no sequencer"));
    }

    #[test]
    fn runs_after_successful_setup() {
        let (done_tx, done_rx) = channel::bounded(1);
        let thread = spawn_when_ready(
            "test watcher",
            || Ok(21),
            move |value: u32| done_tx.send(value * 2).unwrap(),
        )
        .unwrap();

        assert_eq!(done_rx.recv().unwrap(), 42);
        thread.join().unwrap();
    }
}

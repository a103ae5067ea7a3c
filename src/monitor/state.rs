use serde::{Deserialize, Serialize};

use crate::midi::{Device, DeviceId, Msg, PortChange};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogPolicy {
    /// Keeps every decoded message, oldest first.
    #[default]
    Accumulate,
    /// Keeps only the most recent decoded message.
    LastOnly,
}

impl LogPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            LogPolicy::Accumulate => "Keep all",
            LogPolicy::LastOnly => "Last only",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub ts_str: String,
    pub text: String,
}

impl From<Msg> for LogEntry {
    fn from(msg: Msg) -> Self {
        Self {
            ts_str: format!("{}", msg.ts),
            text: msg.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    list: Vec<LogEntry>,
    policy: LogPolicy,
}

impl MessageLog {
    pub fn new(policy: LogPolicy) -> Self {
        Self {
            list: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> LogPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: LogPolicy) {
        self.policy = policy;
        if policy == LogPolicy::LastOnly && self.list.len() > 1 {
            self.list.drain(..self.list.len() - 1);
        }
    }

    pub fn push(&mut self, msg: Msg) {
        if self.policy == LogPolicy::LastOnly {
            self.list.clear();
        }
        self.list.push(msg.into());
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.list
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&LogEntry> {
        self.list.last()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[derive(Debug)]
pub enum Status {
    Unchanged,
    Updated,
}

impl Status {
    pub fn was_updated(&self) -> bool {
        matches!(self, Status::Updated)
    }
}

#[derive(Debug)]
pub enum Event {
    Unsupported,
    AccessGranted {
        inputs: Vec<Device>,
        unmonitored: Vec<DeviceId>,
        sysex: bool,
    },
    AccessFailed {
        reason: String,
    },
    DevicesChanged {
        inputs: Vec<Device>,
        unmonitored: Vec<DeviceId>,
        change: PortChange,
    },
    Message(Msg),
    ClearLog,
    SetLogPolicy(LogPolicy),
}

#[derive(Clone, Debug, Default)]
pub struct MonitorState {
    pub unsupported: bool,
    pub inputs: Vec<Device>,
    /// Inputs which are listed but couldn't be attached.
    pub unmonitored: Vec<DeviceId>,
    pub error: Option<String>,
    pub sysex_enabled: bool,
    pub status: Option<String>,
    pub log: MessageLog,
}

impl MonitorState {
    pub fn new(policy: LogPolicy) -> Self {
        Self {
            log: MessageLog::new(policy),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn reduce(mut self, event: Event) -> Self {
        use Event::*;
        match event {
            Unsupported => {
                self.unsupported = true;
                self.sysex_enabled = false;
            }
            AccessGranted {
                inputs,
                unmonitored,
                sysex,
            } => {
                self.inputs = inputs;
                self.unmonitored = unmonitored;
                self.sysex_enabled = sysex;
                self.error = None;
            }
            AccessFailed { reason } => {
                self.inputs.clear();
                self.unmonitored.clear();
                self.sysex_enabled = false;
                self.error = Some(format!("Error accessing MIDI devices: {}", reason));
            }
            DevicesChanged {
                inputs,
                unmonitored,
                change,
            } => {
                self.inputs = inputs;
                self.unmonitored = unmonitored;
                if change.is_input() {
                    self.status = Some(format!("MIDI input {} : {}", change.state, change.name));
                }
            }
            Message(msg) => self.log.push(msg),
            ClearLog => self.log.clear(),
            SetLogPolicy(policy) => self.log.set_policy(policy),
        }

        self
    }
}

use crate::{
    midi::{Device, PortState},
    monitor::{LogEntry, MonitorState},
};

pub const UNSUPPORTED: &str = "MIDI input access is not supported on this platform.";
pub const NO_INPUTS: &str = "No MIDI inputs detected.";

/// What the window shows, derived from a [`MonitorState`] snapshot.
///
/// The message list is borrowed: the view lives as long as the state lock.
#[derive(Debug, PartialEq, Eq)]
pub struct View<'a> {
    pub unsupported: Option<&'static str>,
    pub error: Option<String>,
    pub inputs: Inputs,
    pub sysex: &'static str,
    pub status: Option<String>,
    pub messages: &'a [LogEntry],
}

#[derive(Debug, PartialEq, Eq)]
pub enum Inputs {
    None(&'static str),
    List(Vec<String>),
}

fn input_label(device: &Device, monitored: bool) -> String {
    let mut label = match device.manufacturer {
        Some(ref manufacturer) => format!("{} ({})", device.name, manufacturer),
        None => device.name.to_string(),
    };

    if device.state == PortState::Disconnected {
        label.push_str(" [disconnected]");
    } else if !monitored {
        label.push_str(" [not monitored]");
    }

    label
}

impl<'a> From<&'a MonitorState> for View<'a> {
    fn from(state: &'a MonitorState) -> Self {
        let inputs = if state.inputs.is_empty() {
            Inputs::None(NO_INPUTS)
        } else {
            Inputs::List(
                state
                    .inputs
                    .iter()
                    .map(|device| input_label(device, !state.unmonitored.contains(&device.id)))
                    .collect(),
            )
        };

        View {
            unsupported: state.unsupported.then(|| UNSUPPORTED),
            error: state.error.clone(),
            inputs,
            sysex: if state.sysex_enabled {
                "SysEx enabled"
            } else {
                "SysEx unavailable"
            },
            status: state.status.clone(),
            messages: state.log.entries(),
        }
    }
}

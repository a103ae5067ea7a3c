use std::fmt;

// Status bytes as interpreted by the monitor. NOTE_ON is not the standard
// Note On status (144), keep it that way.
pub const NOTE_ON: u8 = 178;
pub const NOTE_OFF: u8 = 128;
pub const CONTROL_CHANGE: u8 = 176;

/// Placeholder shown for a data byte missing from a short message.
const MISSING: &str = "?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    NoteOn {
        note: Option<u8>,
        velocity: Option<u8>,
    },
    NoteOff {
        note: Option<u8>,
    },
    ControlChange {
        controller: Option<u8>,
        value: Option<u8>,
    },
    Unhandled(u8),
}

impl Decoded {
    /// Decodes a raw message. Returns `None` for an empty buffer.
    pub fn from_midi(buf: &[u8]) -> Option<Self> {
        let (&status, data) = buf.split_first()?;
        let first = data.first().copied();
        let second = data.get(1).copied();

        Some(match status {
            NOTE_ON => Decoded::NoteOn {
                note: first,
                velocity: second,
            },
            NOTE_OFF => Decoded::NoteOff { note: first },
            CONTROL_CHANGE => Decoded::ControlChange {
                controller: first,
                value: second,
            },
            other => Decoded::Unhandled(other),
        })
    }
}

struct DataByte(Option<u8>);

impl fmt::Display for DataByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(byte) => write!(f, "{}", byte),
            None => f.write_str(MISSING),
        }
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Decoded::*;
        match *self {
            NoteOn { note, velocity } => write!(
                f,
                "Note On: {}, Velocity: {}",
                DataByte(note),
                DataByte(velocity)
            ),
            NoteOff { note } => write!(f, "Note Off: {}", DataByte(note)),
            ControlChange { controller, value } => write!(
                f,
                "Control Change: {}, Value: {}",
                DataByte(controller),
                DataByte(value)
            ),
            Unhandled(status) => write!(f, "Unhandled MIDI command: {}", status),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Msg {
    pub ts: u64,
    pub decoded: Decoded,
}

impl Msg {
    pub fn from_midi(ts: u64, buf: &[u8]) -> Option<Self> {
        Decoded::from_midi(buf).map(|decoded| Msg { ts, decoded })
    }
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.decoded, f)
    }
}

//! Note output backends.

use midir::{MidiOutput, MidiOutputConnection};

use crate::error::{EngineError, Result};

const CLIENT_NAME: &str = "orbit";

/// MIDI message types the engine sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
}

impl MidiMessage {
    /// Convert to raw MIDI bytes
    pub fn to_bytes(&self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn { channel, note, velocity } => {
                [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOff { channel, note } => [0x80 | (channel & 0x0F), note & 0x7F, 0],
        }
    }
}

/// Where the engine sends notes.
pub trait NoteSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<()>;

    fn note_off(&mut self, channel: u8, pitch: u8) -> Result<()>;

    fn name(&self) -> &str;
}

/// Information about an available MIDI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

pub fn list_output_ports() -> Result<Vec<MidiPortInfo>> {
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| EngineError::Output(e.to_string()))?;
    let ports = midi_out
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_out
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index, name })
        })
        .collect();
    Ok(ports)
}

/// Hardware or virtual MIDI output through midir.
pub struct MidiOutputSink {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiOutputSink {
    /// Open an output port. `selector` is a port index or a case-insensitive
    /// name fragment; `None` picks the first port.
    pub fn open(selector: Option<&str>) -> Result<Self> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| EngineError::Output(e.to_string()))?;
        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(EngineError::Output("no MIDI output ports available".to_string()));
        }

        let index = match selector {
            None => 0,
            Some(sel) => match sel.parse::<usize>() {
                Ok(i) if i < ports.len() => i,
                Ok(i) => return Err(EngineError::Output(format!("invalid port index: {}", i))),
                Err(_) => {
                    let wanted = sel.to_lowercase();
                    ports
                        .iter()
                        .position(|p| {
                            midi_out
                                .port_name(p)
                                .map(|n| n.to_lowercase().contains(&wanted))
                                .unwrap_or(false)
                        })
                        .ok_or_else(|| EngineError::Output(format!("no MIDI port matching '{}'", sel)))?
                }
            },
        };

        let port = &ports[index];
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());
        let connection = midi_out
            .connect(port, "orbit-out")
            .map_err(|e| EngineError::Output(e.to_string()))?;
        log::info!(target: "midi", "connected to MIDI output '{}'", port_name);
        Ok(Self {
            connection,
            port_name,
        })
    }

    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        self.connection
            .send(&msg.to_bytes())
            .map_err(|e| EngineError::Output(e.to_string()))
    }
}

impl NoteSink for MidiOutputSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<()> {
        self.send(MidiMessage::NoteOn {
            channel,
            note: pitch,
            velocity,
        })
    }

    fn note_off(&mut self, channel: u8, pitch: u8) -> Result<()> {
        self.send(MidiMessage::NoteOff { channel, note: pitch })
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// Logs every note; for running without MIDI hardware.
#[derive(Debug, Default)]
pub struct LogSink;

impl NoteSink for LogSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<()> {
        log::debug!(target: "midi", "note on  ch={} note={} vel={}", channel, pitch, velocity);
        Ok(())
    }

    fn note_off(&mut self, channel: u8, pitch: u8) -> Result<()> {
        log::debug!(target: "midi", "note off ch={} note={}", channel, pitch);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Debug, Default)]
pub struct NullSink;

impl NoteSink for NullSink {
    fn note_on(&mut self, _channel: u8, _pitch: u8, _velocity: u8) -> Result<()> {
        Ok(())
    }

    fn note_off(&mut self, _channel: u8, _pitch: u8) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_bytes() {
        let on = MidiMessage::NoteOn {
            channel: 2,
            note: 60,
            velocity: 100,
        };
        assert_eq!(on.to_bytes(), [0x92, 60, 100]);
        let off = MidiMessage::NoteOff { channel: 15, note: 72 };
        assert_eq!(off.to_bytes(), [0x8F, 72, 0]);
    }

    #[test]
    fn bytes_are_masked() {
        let on = MidiMessage::NoteOn {
            channel: 17,
            note: 200,
            velocity: 255,
        };
        assert_eq!(on.to_bytes(), [0x91, 200 & 0x7F, 0x7F]);
    }

    #[test]
    fn software_sinks_never_fail() {
        let mut log_sink = LogSink;
        assert!(log_sink.note_on(0, 60, 100).is_ok());
        assert!(log_sink.note_off(0, 60).is_ok());
        let mut null = NullSink;
        assert!(null.note_on(0, 60, 100).is_ok());
        assert_eq!(null.name(), "null");
    }
}

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{info, warn};
use midir::{MidiInput, MidiInputConnection};

use crate::core::pitch::Pitch;

const CLIENT_NAME: &str = "Piano Grid MIDI Input";

/// A key pressed or released on an external controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(Pitch),
    Released(Pitch),
}

/// Decode a raw MIDI message. Keys outside the grid range are ignored.
pub fn parse_message(message: &[u8]) -> Option<KeyEvent> {
    if message.len() < 3 {
        return None;
    }
    let pitch = Pitch::from_midi(message[1])?;
    match message[0] & 0xF0 {
        0x80 => Some(KeyEvent::Released(pitch)),
        // note on with velocity 0 is a note off
        0x90 if message[2] == 0 => Some(KeyEvent::Released(pitch)),
        0x90 => Some(KeyEvent::Pressed(pitch)),
        _ => None,
    }
}

/// Handles MIDI input from connected devices
pub struct MidiInputHandler {
    connection: Option<MidiInputConnection<()>>,
    connected_port: Option<String>,
    sender: Sender<KeyEvent>,
    receiver: Receiver<KeyEvent>,
}

impl Default for MidiInputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiInputHandler {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            connection: None,
            connected_port: None,
            sender,
            receiver,
        }
    }

    /// List all available MIDI input ports
    pub fn list_ports(&self) -> Vec<String> {
        match MidiInput::new(CLIENT_NAME) {
            Ok(midi_in) => midi_in
                .ports()
                .iter()
                .filter_map(|port| midi_in.port_name(port).ok())
                .collect(),
            Err(err) => {
                warn!("Error initializing MIDI input: {}", err);
                Vec::new()
            }
        }
    }

    pub fn connected_port(&self) -> Option<&str> {
        self.connected_port.as_deref()
    }

    /// Connect to a specific MIDI input port by name
    pub fn connect_to_port(&mut self, port_name: &str) -> anyhow::Result<()> {
        self.disconnect();

        let midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|err| anyhow::anyhow!("Failed to create MIDI input: {}", err))?;

        let port = midi_in
            .ports()
            .into_iter()
            .find(|port| midi_in.port_name(port).map(|name| name == port_name).unwrap_or(false))
            .ok_or_else(|| anyhow::anyhow!("MIDI port '{}' not found", port_name))?;

        let sender = self.sender.clone();
        let connection = midi_in
            .connect(
                &port,
                "piano-grid-read-input",
                move |_stamp, message, _| {
                    if let Some(event) = parse_message(message) {
                        sender.send(event).ok();
                    }
                },
                (),
            )
            .map_err(|err| anyhow::anyhow!("Failed to connect to MIDI port: {}", err))?;

        info!("connected to MIDI input '{}'", port_name);
        self.connection = Some(connection);
        self.connected_port = Some(port_name.to_string());
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            info!("disconnected MIDI input");
        }
        self.connected_port = None;
    }

    /// Key events received since the last call
    pub fn drain(&self) -> Vec<KeyEvent> {
        self.receiver.try_iter().collect()
    }
}

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::EngineMessage;
use crate::core::audio::VoiceBank;

/// MessageBus carries commands from the UI thread to the audio callback.
///
/// The receiving side is moved into the audio thread together with the
/// [`VoiceBank`] it drives, so the callback never takes a lock.
pub struct MessageBus {
    pub(crate) sender: Sender<EngineMessage>,
    pub(crate) receiver: Receiver<EngineMessage>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();

        MessageBus { sender, receiver }
    }

    /// Get a sender that can be cloned and handed to the UI
    pub fn sender(&self) -> Sender<EngineMessage> {
        self.sender.clone()
    }

    /// Apply pending messages to the voice bank, at most `max_messages` per call
    pub fn process_messages(&self, bank: &mut VoiceBank, max_messages: usize) -> usize {
        let mut count = 0;

        while count < max_messages {
            let Ok(msg) = self.receiver.try_recv() else {
                break;
            };
            count += 1;
            bank.handle(msg);
        }

        count
    }
}

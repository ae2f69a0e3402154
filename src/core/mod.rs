pub mod audio;
pub mod chords;
pub mod editor;
pub mod grid;
pub mod midi_import;
pub mod midi_input;
pub mod note;
pub mod pitch;
pub mod playback;
pub mod render;
pub mod staff;
pub mod store;

pub use note::{Note, NoteId, NoteSpec};
pub use pitch::Pitch;
pub use store::NoteStore;

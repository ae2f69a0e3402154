mod keyboard;
mod notifications;
mod piano_roll;
mod staff_view;

pub use keyboard::{KeyAction, KeyboardStrip};
pub use notifications::Notifications;
pub use piano_roll::PianoRoll;
pub use staff_view::StaffView;

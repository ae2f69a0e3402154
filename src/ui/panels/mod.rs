pub mod toolbar;

pub use toolbar::{ToolbarAction, ToolbarState};

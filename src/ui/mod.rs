pub mod components;
pub mod panels;

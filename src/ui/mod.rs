//! UI components for the pool bars map.
//!
//! Each component draws one part of the window and hands user input back to
//! the app instead of touching state directly.

pub mod header;
pub mod popup;
pub mod sidebar;

pub use popup::PopupAction;

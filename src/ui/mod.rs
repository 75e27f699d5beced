//! Terminal UI components.

mod command;
mod layout;
mod scanner_panel;
pub mod settings_menu;
mod status_bar;

pub use layout::draw_ui;

//! Terminal output helpers for the interactive session.

use crossterm::style::Stylize;

/// Inbound chat message, highlighted so it stands out from typed input.
pub fn incoming(payload: &str) {
    println!("{}", payload.black().on_green());
}

/// Warning shown to the user without ending the session.
pub fn notice(text: &str) {
    println!("{}", text.red().on_white());
}

pub fn info(text: &str) {
    println!("{text}");
}

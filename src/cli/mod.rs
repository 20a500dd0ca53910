mod commands;
mod terminal;

pub use commands::*;

//! IRC protocol layer: framing, parsing, connection lifecycle, idle watchdog
//! and command routing.

pub mod commands;
pub mod connection;
pub mod framer;
pub mod manager;
pub mod parser;
pub mod state;
pub mod watchdog;

// fraglog - platform/mod.rs
//
// Platform layer: config file location and loading, signal handling, and
// the duplicating output writer.

pub mod config;
pub mod signal;
pub mod tee;

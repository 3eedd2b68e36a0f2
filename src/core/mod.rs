// fraglog - core/mod.rs
//
// Core layer: colour normalisation, line classification, match state, and
// the record model. No I/O beyond `Write` trait objects.

pub mod classifier;
pub mod color;
pub mod export;
pub mod model;
pub mod record;

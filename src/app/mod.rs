// fraglog - app/mod.rs
//
// Application layer: the per-line event loop over the current match.
// Dependencies: core layer.

pub mod driver;

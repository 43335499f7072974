//! Library half of `ur-tool`, split out so integration tests can drive the
//! commands without spawning the binary.

pub mod commands;
pub mod ui;

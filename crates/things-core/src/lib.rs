//! Script synthesis and result decoding for driving Things 3 through
//! AppleScript.

pub mod client;
pub mod command;
pub mod config;
pub mod container;
pub mod dates;
pub mod decode;
pub mod escape;
pub mod host_value;
pub mod runner;
pub mod script;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

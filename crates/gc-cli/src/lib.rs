//! gridctl: operator console for an OpenSim grid
//!
//! Starts, stops and inspects the Robust directory process and the estate
//! simulators of a farm host, each running in its own tmux window.

pub mod commands;
pub mod output;

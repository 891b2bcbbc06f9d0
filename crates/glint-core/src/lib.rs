//! glint core
//!
//! Shared utilities for the glint crates: logging bootstrap, profiling
//! scopes and the math types used on the CPU side of the compositor.

pub mod logging;
pub mod math;
pub mod profiling;

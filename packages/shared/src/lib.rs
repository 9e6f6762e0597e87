//! Utilities shared by the buzzer quiz binaries and their tests.

pub mod logger;
pub mod time;

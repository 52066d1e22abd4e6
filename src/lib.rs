// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod persistence;
pub mod protocol;

pub use crate::config::EngineConfig;
pub use crate::core::engine::{Command, ImeEngine, Notification};
pub use crate::error::{ImeError, Result};

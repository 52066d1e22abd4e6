// src/core/mod.rs
pub mod dictionary;
pub mod engine;
pub mod resolver;
pub mod session;
pub mod types;

// src/services/mod.rs

pub mod assembler;
pub mod bank;
pub mod recorder;
pub mod reporter;
pub mod server;

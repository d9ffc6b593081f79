// src/handlers/mod.rs

pub mod challenges;
pub mod preview;
pub mod session;
pub mod sql;

// src/session/mod.rs

pub mod quiz;
pub mod store;

// src/models/mod.rs

pub mod attempt;
pub mod challenge;
pub mod execution;
pub mod result_set;
pub mod session;

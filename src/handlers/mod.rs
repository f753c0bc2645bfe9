// src/handlers/mod.rs

pub mod assignments;
pub mod results;
pub mod staff;

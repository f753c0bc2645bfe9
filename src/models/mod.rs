// src/models/mod.rs

pub mod assignment;
pub mod review;
pub mod statistics;
pub mod submission;

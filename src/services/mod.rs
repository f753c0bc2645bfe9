// src/services/mod.rs

pub mod assessment;
pub mod grading;
pub mod review;
pub mod statistics;

pub use assessment::AssessmentService;

//! # Leadboard Common Library
//!
//! Shared code for the leadboard service and its tools:
//! - Error type
//! - Configuration loading
//! - Database schema and initialization
//! - Lead, stage and stats models
//! - Field normalization between storage columns and API names
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{Assessment, AssessmentResult, ContactInfo, Lead, Overall, Questionnaire, Stage, Stats};

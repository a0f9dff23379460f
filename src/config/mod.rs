//! Configuration module for ragconsole
//!
//! This module defines the application settings, search modes and path helpers.

pub mod app_config;
pub mod path_resolver;
mod search_config;

pub use app_config::AppConfig;
pub use search_config::{SearchMode, WeightVector, WEIGHT_STEP};

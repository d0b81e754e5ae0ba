//! # Web Handlers
//!
//! - [`health`] - status endpoint
//! - [`dashboard`] - dashboard page, data API and event feed

pub mod dashboard;
pub mod health;

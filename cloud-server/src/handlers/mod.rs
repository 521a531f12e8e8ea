//! HTTP handlers

pub mod health;
pub mod upload;
pub mod files;
pub mod dashboard;
pub mod events;
pub mod model;

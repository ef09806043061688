//! # Verso Core
//!
//! The domain layer of the Verso blogging platform.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod reading_time;
pub mod service;
pub mod slug;

pub use error::DomainError;

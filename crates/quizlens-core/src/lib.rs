//! quizlens-core: report pipeline, data model, and persistence.
//!
//! This crate defines the record model, the field registry, the pure
//! filter/transform/aggregate/chart stages, and the [`engine::ReportingEngine`]
//! that runs them against a [`source::DataSource`] and persists report
//! definitions through a [`store::ReportStore`].

pub mod aggregate;
pub mod attendance;
pub mod charts;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod filter;
pub mod model;
pub mod report;
pub mod source;
pub mod store;
pub mod time_analytics;
pub mod transform;

//! # flightdeck-core
//!
//! Core types, errors, and utilities for the Flightdeck dashboard.
//!
//! This crate provides:
//! - [`FlightdeckError`] - Error types for all Flightdeck operations
//! - [`logging`] - Tracing setup and the UI log-buffer bridge
//! - [`logbuf`] - The bounded, concurrently-accessed log buffer
//! - [`perf`] - Content-change detection and adaptive refresh intervals
//! - [`types`] - Shared work-item and workflow-progress definitions
//! - [`platform`] - Terminal capability probing and console-mode detection

pub mod error;
pub mod logbuf;
pub mod logging;
pub mod perf;
pub mod platform;
pub mod types;

// Re-export main types for convenience
pub use error::{FlightdeckError, Result};
pub use logbuf::{DEFAULT_LOG_CAPACITY, LogBuffer, LogEntry, LogLevel};
pub use logging::{LogGuard, init_logging};
pub use perf::{AdaptiveInterval, ChangeDetector, ContentChange};
pub use types::{ProgressTracker, StepStatus, WorkItem, WorkflowStep, default_workflow_steps};

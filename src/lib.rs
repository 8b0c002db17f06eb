//! lazyselect - lazily paginated, keyboard-driven selection controls
//!
//! This library provides the state machines behind a searchable select whose
//! options come page by page from an asynchronous data source. It tracks page
//! history for cursor-style pagination, lets only the most recently issued
//! fetch update the control, detects the end of the stream with a one-item
//! overflow probe, and manages keyboard focus over the loaded options.
//!
//! # Modules
//!
//! * [`config`] - Configuration management
//! * [`query`] - Data source boundary, page history and fetch coordination
//! * [`select`] - Session, focus and the select/assigner controls
//! * [`ui`] - Terminal input and rendering adapter

/// Configuration module for managing control settings
pub mod config;

/// Default values and UI text
pub mod constants;

/// Logging setup and in-memory log buffer
pub mod logger;

/// Query sources, page history and the fetch coordinator
pub mod query;

/// Selection controls
pub mod select;

/// Terminal rendering and input adapter
pub mod ui;

pub use query::{Filter, FilterOp, FilterSet, PageRequest, QueryError, QueryResult, QuerySource, QueryStatus};
pub use select::{LazySelect, MultiAssigner, SelectItem};

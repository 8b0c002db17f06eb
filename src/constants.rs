//! Constants used throughout the library
//!
//! This module centralizes defaults, UI text, and log message fragments so the
//! state machine and the render adapter agree on them.

// Pagination
/// Page size used when the caller supplies none or a non-positive value
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Number of options PageUp/PageDown move the focus by
pub const DEFAULT_PAGE_JUMP: usize = 10;
/// Distance from the end of the loaded list at which the next page is requested
pub const DEFAULT_SCROLL_THRESHOLD: usize = 2;
/// Largest page size accepted by configuration validation
pub const MAX_PAGE_SIZE: usize = 500;

// UI Text
pub const PLACEHOLDER_NO_SELECTION: &str = "Select…";
pub const UNKNOWN_SELECTION_PLACEHOLDER: &str = "⚠ Unknown value";
pub const LABEL_LOADING: &str = "⏳ Loading…";
pub const LABEL_END_OF_STREAM: &str = "— end of results —";
pub const LABEL_EMPTY: &str = "No results";
pub const LABEL_ERROR_PREFIX: &str = "❌ Failed to load";

// Logging
pub const LOG_FILE_NAME: &str = "lazyselect.log";
pub const LOG_TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";
/// Entries kept in the in-memory log buffer
pub const MAX_LOG_ENTRIES: usize = 1000;

// Configuration
pub const CONFIG_FILE_NAME: &str = "lazyselect.toml";
pub const CONFIG_DIR_NAME: &str = "lazyselect";
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";

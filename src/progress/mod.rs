//! Progress aggregation and display.
//!
//! # Overview
//!
//! - `aggregator` - Weighted overall progress across concurrent operations
//! - `style` - Progress bar styling options and templates
//! - `display` - Optional terminal display built on `indicatif`
//!
//! # Examples
//!
//! ## Tracking Query Resolution Alongside Downloads
//!
//! ```rust
//! use vidqueue::progress::{ProgressManager, DOWNLOAD_WEIGHT, QUERY_WEIGHT};
//!
//! let manager = ProgressManager::new();
//! let query = manager.create_operation(QUERY_WEIGHT);
//! let download = manager.create_operation(DOWNLOAD_WEIGHT);
//!
//! query.report(1.0);
//! assert!(manager.progress() < 0.01);
//!
//! drop(query);
//! drop(download);
//! assert!(!manager.is_active());
//! ```

pub mod aggregator;
pub mod display;
pub mod style;

pub use aggregator::{
    NullSink, ProgressManager, ProgressOperation, ProgressSink, DOWNLOAD_WEIGHT, QUERY_WEIGHT,
};
pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};

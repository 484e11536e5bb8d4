//! # Catalog Export
//!
//! Incremental placement-data export for linked catalog sources.
//!
//! A master catalog document places hundreds of linked source documents;
//! extracting graphics positions, text positions and labeled items from all
//! of them on every run is expensive. This crate is the incremental layer
//! around that extraction:
//!
//! - **Cache keys** derived from the placed reference, not the file path, so
//!   entries survive file moves
//! - **Staleness detection** on file modification time
//! - **Fallback search** that relocates sources whose recorded path went
//!   stale (bounded depth, case-insensitive, newest match wins)
//! - **Batch coordination** with per-item failure isolation, locked-file
//!   recovery via temporary working copies, and cooperative cancellation
//! - **Output assembly** into a single deduplicated CSV
//!
//! The content extraction itself and the host document session are consumed
//! through small traits ([`host::DocumentHost`], [`host::ContentExtractor`]);
//! the crate ships a file-backed adapter ([`host::LocalHost`]) and a
//! scripted one for tests ([`host::MockHost`]).
//!
//! ## Quick Start
//!
//! ```ignore
//! use catalog_export::{
//!     assembler, BatchCoordinator, CacheStore, ExportConfig, ExportSettings,
//!     FileLocator, IncrementalPlanner, Manifest, NoProgress,
//! };
//! use catalog_export::host::{LocalExtractor, LocalHost};
//!
//! # fn main() -> catalog_export::Result<()> {
//! let config = ExportConfig::new("/srv/pages", "/srv/cache");
//! let items = Manifest::load("manifest.json".as_ref())?.into_items();
//!
//! let locator = FileLocator::new(&config.fallback_root);
//! let store = CacheStore::new(&config.cache_dir);
//! let host = LocalHost::new();
//! let extractor = LocalExtractor::new();
//! let progress = NoProgress;
//!
//! let coordinator = BatchCoordinator::new(&host, &extractor, &progress);
//! let planner = IncrementalPlanner::new(&locator, &store, &coordinator, &progress);
//! let result = planner.run(items, &ExportSettings::default());
//!
//! let csv = assembler::assemble(&result.records);
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Work units and results
pub mod item;
pub mod record;

// File resolution and cache persistence
pub mod cache;
pub mod locator;

// Host document session (traits + adapters)
pub mod host;

// Pipeline
pub mod assembler;
pub mod coordinator;
pub mod planner;
pub mod progress;

// Catalog hand-off
pub mod manifest;

// Re-exports
pub use cache::{CacheEntry, CacheMap, CacheStore};
pub use config::{ExportConfig, ExportSettings};
pub use coordinator::{BatchCoordinator, BatchOutput};
pub use error::{Error, Result};
pub use item::{ExportItem, ExportMode, PageContext, PageSide};
pub use locator::FileLocator;
pub use manifest::{Manifest, PlacedLink};
pub use planner::IncrementalPlanner;
pub use progress::{ConsoleProgress, NoProgress, ProgressReporter};
pub use record::{CsvRecord, ItemFailure, RunResult};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

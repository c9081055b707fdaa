//! Traffic pipeline core — fetch, validate, and merge per-country traffic
//! series from the transparency-report API.
//!
//! The pipeline has three independent stages sharing the series store:
//! - Download: month-aligned windows → retrying fetch client → one CSV per
//!   entity, with gaps recorded instead of raised.
//! - Validation: every stored series' timestamp index compared against the
//!   first one (set difference both ways plus positional comparison).
//! - Merge: all stored series reindexed onto the sorted union of their
//!   timestamps into one wide table with explicit `NA` cells.

pub mod config;
pub mod decode;
pub mod download;
pub mod fetch;
pub mod merge;
pub mod retry;
pub mod series;
pub mod stats;
pub mod store;
pub mod transport;
pub mod validate;
pub mod window;

pub use config::PipelineConfig;
pub use download::{download_entities, DownloadSummary};
pub use fetch::{FetchClient, FetchObserver};
pub use merge::{merge_series, merge_store_to_file, MergedTable, MergeStats};
pub use retry::RetryPolicy;
pub use series::{Series, TimePoint};
pub use stats::RunStats;
pub use store::SeriesStore;
pub use transport::{HttpTransport, Transport};
pub use validate::{validate_store, ValidationSummary};
pub use window::{month_windows, RequestWindow};

//! Revenue aggregation pipeline for e-commerce transaction exports.
//!
//! Load a CSV with [`ingest::read_table`], enrich it with
//! [`pipeline::load_and_enrich`] (revenue and month period per row), then
//! group it with [`aggregate::aggregate`] or build a whole
//! [`report::Dashboard`]. Rendering is left to the caller; the bundled
//! binary prints text, markdown or JSON.
//!
//! ```no_run
//! use ecommerce_revenue_pipeline::{aggregate, ingest, pipeline, Dimension, Metric, PipelineConfig};
//!
//! let table = ingest::read_table("orders.csv".as_ref())?;
//! let records = pipeline::load_and_enrich(&table, &PipelineConfig::default())?;
//! let by_region = aggregate::aggregate(&records, &[Dimension::Region], Metric::SumRevenue)?;
//! for row in &by_region.rows {
//!     println!("{}: {:.2}", row.keys[0], row.revenue);
//! }
//! # Ok::<(), ecommerce_revenue_pipeline::PipelineError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{DiscountUnit, PipelineConfig};
pub use error::{PipelineError, Result};
pub use models::{AggregateResult, AggregateRow, Dimension, EnrichedRecord, Metric, RawTable};

//! Claims data ingestion.
//!
//! Reads historical claims extracts (CSV, or the raw pipe-delimited text
//! after [`convert_delimited`]) into a typed [`claims_model::Dataset`].
//!
//! # Features
//!
//! - **CSV Loading**: every column read as text with Polars, then coerced
//! - **Type Coercion**: numeric, date, yes/no and categorical columns
//! - **Schema Check**: required columns reported together
//! - **Derived Columns**: `Margin` and `HasClaim`
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use claims_ingest::{LoadOptions, load_dataset};
//!
//! let loaded = load_dataset(Path::new("data/claims.csv"), &LoadOptions::default())?;
//! println!("{} rows", loaded.dataset.height());
//! ```

pub mod coerce;
mod convert;
mod derive;
mod error;
mod loader;
mod options;
mod reader;

// === Error Types ===
pub use error::{IngestError, Result};

// === Loading ===
pub use loader::{LoadedDataset, delimiter_byte, load_dataset};
pub use options::LoadOptions;
pub use reader::read_raw_table;

// === Conversion & Derivation ===
pub use coerce::parse_date;
pub use convert::convert_delimited;
pub use derive::add_derived_columns;

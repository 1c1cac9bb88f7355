//! Data layer: core types, loading, and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → raw records
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Dataset   │  schema inference, Vec<Row>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  apply FilterSpec → RowView
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;

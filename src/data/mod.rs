//! Data layer: the dataset model and its tabular formats.
//!
//! Architecture:
//! ```text
//!  .csv / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse file → SpectralDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────────┐
//!   │ SpectralDataset │  wavelengths, spectra grid, metadata, layout
//!   └─────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  writer  │  SpectralDataset → .csv / .parquet
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod writer;

pub use loader::{load_file, LoadOptions};
pub use model::{ColumnSlot, DatasetError, MetadataColumn, MetadataValue, SpectralDataset};
pub use writer::{write_csv, write_parquet};

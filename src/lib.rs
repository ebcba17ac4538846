//! Baseline estimation and removal for spectral datasets.
//!
//! ```text
//!   .csv / .parquet
//!         │
//!         ▼
//!   ┌──────────────┐
//!   │ data::loader │  parse file → SpectralDataset
//!   └──────────────┘
//!         │
//!         ▼
//!   ┌────────────────┐      ┌──────────────────────────┐
//!   │ remove_baseline │ ───▶ │ baseline::Method registry │
//!   └────────────────┘      └──────────────────────────┘
//!         │                            │
//!         │                            ▼
//!         │                 BaselineEstimator::fit_transform
//!         ▼
//!   Removal::Removed { corrected, baseline }   or   Removal::NotRecognized (== 0)
//! ```

pub mod baseline;
pub mod data;
pub mod remove;

pub use baseline::{BaselineEstimator, FitResult, Method, ParamRange, ParamRanges, ParamValue, Params, ScaleKind};
pub use data::model::SpectralDataset;
pub use remove::{remove_baseline, remove_baseline_segmented, Removal, NOT_RECOGNIZED};

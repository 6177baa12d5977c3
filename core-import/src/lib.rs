//! # Catalog Import Module
//!
//! Imports a Discogs collection CSV export into a markdown vinyl catalog.
//!
//! ## Overview
//!
//! This module handles:
//! - CSV parsing and row-to-record mapping
//! - Dual-key identity resolution (release id, then artist+title)
//! - Upsert of record notes with non-destructive field merging
//! - Throttled Discogs lookups and cover artwork attachment
//! - Catalog-wide cover backfill for previously imported notes

pub mod backfill;
pub mod config;
pub mod covers;
pub mod csv;
pub mod discogs;
pub mod error;
pub mod fields;
pub mod import;
pub mod index;
pub mod mapper;
pub mod record;

pub use backfill::{BackfillOptions, BackfillSummary, CoverBackfill};
pub use config::CatalogConfig;
pub use covers::CoverService;
pub use discogs::{DiscogsClient, ThrottleState};
pub use error::{ImportError, Result};
pub use import::{DiscogsImporter, ImportOptions, ImportSummary};
pub use index::IdentityIndex;
pub use mapper::ImportRecord;
pub use record::{RecordDraft, RecordService};

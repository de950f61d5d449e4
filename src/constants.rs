//! # Constants and type definitions for desi_wedge
//!
//! This module centralizes the **default tuning values**, the **canonical column names** and the
//! **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Core type aliases (angles, redshift, survey identifiers)
//! - Default loader / quality-cut values
//! - Canonical column names and the raw-name alias chains that feed them
//!
//! These definitions are used by the loader, the emission reader, the quality joiner and the
//! wedge projector.

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Spectroscopic redshift (dimensionless)
pub type Redshift = f64;
/// Survey target identifier (`TARGETID`)
pub type TargetId = i64;

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Default cap on the number of rows returned by one load call
pub const DEFAULT_MAX_ROWS: usize = 50_000;

/// Default minimum signal-to-noise ratio for an emission-line detection
pub const DEFAULT_MIN_SNR: f64 = 3.0;

/// Default Arrow batch size used when reading Parquet catalogs
pub const DEFAULT_BATCH_SIZE: usize = 8192;

// -------------------------------------------------------------------------------------------------
// Canonical columns
// -------------------------------------------------------------------------------------------------

/// Raw column names accepted for the target identifier, in priority order.
pub const ID_ALIASES: &[&str] = &["TARGETID", "TARGET_ID"];

/// Raw column names accepted for right ascension, in priority order.
pub const RA_ALIASES: &[&str] = &["RA"];

/// Raw column names accepted for declination, in priority order.
pub const DEC_ALIASES: &[&str] = &["DEC"];

/// Raw column names accepted for redshift, in priority order.
pub const REDSHIFT_ALIASES: &[&str] = &["Z", "Z_not4clus", "REDSHIFT"];

/// Raw column names accepted for the systematic weight, in priority order.
pub const WEIGHT_ALIASES: &[&str] = &["WEIGHT_SYSTOT", "WEIGHT", "WEIGHT_ZFAIL"];

/// FastSpecFit star-formation rate derived from Hα
pub const SFR_HALPHA_COLUMN: &str = "SFR_HALPHA";
/// FastSpecFit star-formation rate derived from [OII]
pub const SFR_OII_COLUMN: &str = "SFR_OII";
/// FastSpecFit stellar mass
pub const STELLAR_MASS_COLUMN: &str = "STELLAR_MASS";

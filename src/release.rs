//! # DESI DR1 file layout
//!
//! Names and URLs of the public DR1 products read by this crate. These are pure string
//! builders: fetching the files is up to the caller, and the local copies are then opened through
//! a [`RecordSource`](crate::sources::RecordSource).
//!
//! * Large-scale-structure clustering catalogs:
//!   `{LSS_URL}/{tracer}_{region}_clustering.dat.fits`
//! * FastSpecFit catalogs, split in the 12 HEALPix pixels of `nside = 1` for the main survey:
//!   `{FASTSPECFIT_URL}/fastspec-iron-{survey}-nside1-hp{pixel:02}.fits`, a single
//!   `fastspec-iron-{survey}.fits` otherwise.
use std::fmt;
use std::str::FromStr;

use crate::catalog_errors::CatalogError;

/// Root of the DR1 public release.
pub const DR1_BASE_URL: &str = "https://data.desi.lbl.gov/public/dr1";

/// LSS clustering catalogs (iron, v1.5).
pub const LSS_URL: &str = "https://data.desi.lbl.gov/public/dr1/survey/catalogs/dr1/LSS/iron/LSScats/v1.5";

/// FastSpecFit value-added catalogs (iron, v3.0).
pub const FASTSPECFIT_URL: &str =
    "https://data.desi.lbl.gov/public/dr1/vac/dr1/fastspecfit/iron/v3.0/catalogs";

/// Number of HEALPix pixels at `nside = 1`.
pub const NSIDE1_PIXELS: u8 = 12;

/// Galaxy tracer of the clustering catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tracer {
    /// Emission line galaxies, low priority, excluding QSO targets
    ElgLopNotQso,
    /// Luminous red galaxies
    Lrg,
    /// Bright galaxy survey
    BgsBright,
    /// Quasars
    Qso,
}

impl Tracer {
    pub const ALL: [Tracer; 4] = [
        Tracer::ElgLopNotQso,
        Tracer::Lrg,
        Tracer::BgsBright,
        Tracer::Qso,
    ];

    /// Name used in file names and as catalog category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tracer::ElgLopNotQso => "ELG_LOPnotqso",
            Tracer::Lrg => "LRG",
            Tracer::BgsBright => "BGS_BRIGHT",
            Tracer::Qso => "QSO",
        }
    }
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tracer {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tracer::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::InvalidParameter(format!("unknown tracer '{s}'")))
    }
}

/// Galactic cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Ngc,
    Sgc,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Ngc => "NGC",
            Region::Sgc => "SGC",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGC" => Ok(Region::Ngc),
            "SGC" => Ok(Region::Sgc),
            _ => Err(CatalogError::InvalidParameter(format!(
                "unknown region '{s}', expected NGC or SGC"
            ))),
        }
    }
}

pub fn clustering_filename(tracer: Tracer, region: Region) -> String {
    format!("{tracer}_{region}_clustering.dat.fits")
}

pub fn clustering_url(tracer: Tracer, region: Region) -> String {
    format!("{LSS_URL}/{}", clustering_filename(tracer, region))
}

/// FastSpecFit file name for a survey/program and HEALPix pixel.
///
/// Arguments
/// -----------------
/// * `survey` – e.g. `"main-dark"`, `"main-bright"`, `"sv3-dark"`.
/// * `healpix` – `nside = 1` pixel, used only for `main-*` surveys.
///
/// Return
/// ----------
/// * `Err(CatalogError::InvalidParameter)` for an empty survey or a pixel outside `0..12` on a
///   main survey.
pub fn fastspec_filename(survey: &str, healpix: u8) -> Result<String, CatalogError> {
    if survey.trim().is_empty() {
        return Err(CatalogError::InvalidParameter(
            "survey name cannot be empty".into(),
        ));
    }
    if !survey.starts_with("main") {
        return Ok(format!("fastspec-iron-{survey}.fits"));
    }
    if healpix >= NSIDE1_PIXELS {
        return Err(CatalogError::InvalidParameter(format!(
            "healpix {healpix} out of range for nside=1 (0..{NSIDE1_PIXELS})"
        )));
    }
    Ok(format!("fastspec-iron-{survey}-nside1-hp{healpix:02}.fits"))
}

pub fn fastspec_url(survey: &str, healpix: u8) -> Result<String, CatalogError> {
    Ok(format!("{FASTSPECFIT_URL}/{}", fastspec_filename(survey, healpix)?))
}

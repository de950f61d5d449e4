//! # Catalog loader
//!
//! Turns the raw rows of a [`RecordSource`] into a normalized, immutable [`CatalogTable`].
//!
//! ## Pipeline
//!
//! 1. **Fetch** – the source is asked only for the columns of the alias chains
//!    (see [`crate::constants`]). Any failure to obtain rows surfaces as
//!    [`CatalogError::SourceUnavailable`].
//! 2. **Resolve** – `id`, `ra`, `dec` and `redshift` must resolve to a raw column, otherwise the
//!    load fails with [`CatalogError::MissingColumn`]. `weight` is optional.
//! 3. **Admissibility** – a row is kept when its id is non-null, its redshift is finite and
//!    non-negative, its `ra` and `dec` are finite, and it satisfies every configured range filter
//!    (bounds inclusive).
//! 4. **Uniqueness** – the first occurrence of an id wins; later repeats are dropped.
//! 5. **Subsampling** – when more than [`LoadParams::max_rows`] rows survive, exactly `max_rows`
//!    distinct rows are drawn uniformly without replacement. The chosen rows keep their source
//!    order, and the draw is reproducible when [`LoadParams::seed`] is set.
//!
//! A load either returns a complete table or an error, never a partial table.
//!
//! ## Example
//!
//! ```rust,no_run
//! use desi_wedge::loader::{load_catalog, LoadParams};
//! use desi_wedge::sources::parquet_reader::ParquetSource;
//!
//! let params = LoadParams::builder()
//!     .max_rows(10_000)
//!     .z_range(0.6, 1.6)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let source = ParquetSource::new("ELG_LOPnotqso_NGC_clustering.parquet");
//! let table = load_catalog(&source, &params, "ELG_LOPnotqso", Some("NGC")).unwrap();
//! println!("{:#}", table.summary().unwrap());
//! ```
use std::cmp::Ordering::{Equal, Less};
use std::collections::HashSet;
use std::fmt;

use ahash::RandomState;
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::{CatalogRecord, CatalogTable};
use crate::catalog_errors::CatalogError;
use crate::constants::{
    Degree, Redshift, TargetId, DEC_ALIASES, DEFAULT_MAX_ROWS, ID_ALIASES, RA_ALIASES,
    REDSHIFT_ALIASES, WEIGHT_ALIASES,
};
use crate::sources::{RawColumn, RawTable, RecordSource};

/// Inclusive `(min, max)` bounds on one field.
pub type Bounds = (f64, f64);

#[inline]
fn within(bounds: Option<Bounds>, value: f64) -> bool {
    bounds.map_or(true, |(lo, hi)| lo <= value && value <= hi)
}

/// Parameters of one [`load_catalog`] call.
///
/// Fields
/// -----------------
/// * `max_rows` – upper bound on the number of rows returned (≥ 1).
/// * `ra_range` – optional inclusive right-ascension bounds (degrees).
/// * `dec_range` – optional inclusive declination bounds (degrees).
/// * `z_range` – optional inclusive redshift bounds.
/// * `seed` – seed of the subsampling generator; `None` draws from OS entropy.
///
/// Defaults
/// -----------------
/// * `max_rows`: 50 000
/// * `ra_range`, `dec_range`, `z_range`: `None` (no cut)
/// * `seed`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct LoadParams {
    pub max_rows: usize,
    pub ra_range: Option<(Degree, Degree)>,
    pub dec_range: Option<(Degree, Degree)>,
    pub z_range: Option<(Redshift, Redshift)>,
    pub seed: Option<u64>,
}

impl LoadParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`LoadParamsBuilder`] initialized with the default values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use desi_wedge::loader::LoadParams;
    ///
    /// let params = LoadParams::builder()
    ///     .ra_range(100.0, 270.0)
    ///     .seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.max_rows, 50_000);
    /// ```
    pub fn builder() -> LoadParamsBuilder {
        LoadParamsBuilder::new()
    }
}

impl Default for LoadParams {
    fn default() -> Self {
        LoadParams {
            max_rows: DEFAULT_MAX_ROWS,
            ra_range: None,
            dec_range: None,
            z_range: None,
            seed: None,
        }
    }
}

/// Builder for [`LoadParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct LoadParamsBuilder {
    params: LoadParams,
}

impl LoadParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: LoadParams::default(),
        }
    }

    pub fn max_rows(mut self, v: usize) -> Self {
        self.params.max_rows = v;
        self
    }
    pub fn ra_range(mut self, min: Degree, max: Degree) -> Self {
        self.params.ra_range = Some((min, max));
        self
    }
    pub fn dec_range(mut self, min: Degree, max: Degree) -> Self {
        self.params.dec_range = Some((min, max));
        self
    }
    pub fn z_range(mut self, min: Redshift, max: Redshift) -> Self {
        self.params.z_range = Some((min, max));
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.params.seed = Some(v);
        self
    }

    /// Return true iff a <= b, both finite.
    #[inline]
    fn ordered(a: f64, b: f64) -> bool {
        a.is_finite() && b.is_finite() && matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `max_rows ≥ 1`.
    /// * Every configured range has finite bounds with `min ≤ max`.
    ///
    /// Returns
    /// -----------------
    /// * `Err(CatalogError::InvalidParameter)` naming the first offending field.
    pub fn build(self) -> Result<LoadParams, CatalogError> {
        let p = &self.params;

        if p.max_rows == 0 {
            return Err(CatalogError::InvalidParameter(
                "max_rows must be >= 1".into(),
            ));
        }

        for (name, range) in [
            ("ra_range", p.ra_range),
            ("dec_range", p.dec_range),
            ("z_range", p.z_range),
        ] {
            if let Some((lo, hi)) = range {
                if !Self::ordered(lo, hi) {
                    return Err(CatalogError::InvalidParameter(format!(
                        "{name} must be finite with min <= max, got ({lo}, {hi})"
                    )));
                }
            }
        }

        Ok(self.params)
    }
}

struct DisplayBounds(Option<Bounds>);

impl fmt::Display for DisplayBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((lo, hi)) => write!(f, "[{lo}, {hi}]"),
            None => write!(f, "any"),
        }
    }
}

impl fmt::Display for LoadParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seed = self
            .seed
            .map_or_else(|| "entropy".to_string(), |s| s.to_string());

        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Catalog Load Parameters")?;
            writeln!(f, "-----------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!("max_rows  = {}", self.max_rows, "Cap on returned rows")?;
            line!(
                "ra_range  = {}",
                DisplayBounds(self.ra_range),
                "Right ascension cut (deg)"
            )?;
            line!(
                "dec_range = {}",
                DisplayBounds(self.dec_range),
                "Declination cut (deg)"
            )?;
            line!("z_range   = {}", DisplayBounds(self.z_range), "Redshift cut")?;
            line!("seed      = {}", seed, "Subsampling seed")?;
            Ok(())
        } else {
            write!(
                f,
                "LoadParams(max_rows={}, ra={}, dec={}, z={}, seed={})",
                self.max_rows,
                DisplayBounds(self.ra_range),
                DisplayBounds(self.dec_range),
                DisplayBounds(self.z_range),
                seed,
            )
        }
    }
}

/// Raw column names the loader may read, in alias order.
fn wanted_columns() -> Vec<&'static str> {
    ID_ALIASES
        .iter()
        .chain(RA_ALIASES)
        .chain(DEC_ALIASES)
        .chain(REDSHIFT_ALIASES)
        .chain(WEIGHT_ALIASES)
        .copied()
        .collect()
}

fn required<'a>(
    raw: &'a RawTable,
    aliases: &[&str],
    field: &str,
) -> Result<(&'a str, &'a RawColumn), CatalogError> {
    raw.resolve(aliases).ok_or_else(|| {
        CatalogError::MissingColumn(format!("{field} (tried {})", aliases.join(", ")))
    })
}

/// Draw `amount` distinct positions among `0..len`, returned in increasing order.
fn subsample_positions(len: usize, amount: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut picked = rand::seq::index::sample(&mut rng, len, amount).into_vec();
    picked.sort_unstable();
    picked
}

/// Load one galaxy sample from a record source.
///
/// Arguments
/// -----------------
/// * `source` – where the raw rows come from.
/// * `params` – row cap, range filters and subsampling seed.
/// * `category` – tracer tag attached to the table (e.g. `"LRG"`).
/// * `region` – optional sky-region tag (e.g. `"NGC"`).
///
/// Return
/// ----------
/// * `Ok(CatalogTable)` with `1 ≤ len ≤ params.max_rows` rows, unique ids, finite positions
///   and finite non-negative redshifts.
/// * `Err(CatalogError::SourceUnavailable)` if the rows could not be obtained.
/// * `Err(CatalogError::MissingColumn)` if `id`, `ra`, `dec` or `redshift` cannot be resolved.
/// * `Err(CatalogError::ColumnType)` if a resolved column has an unusable type.
/// * `Err(CatalogError::EmptyResult)` if no row survives the admissibility cuts.
///
/// See also
/// ------------
/// * [`LoadParams`] – Configuration of the cuts.
/// * [`crate::quality::join`] – Next stage of the pipeline.
pub fn load_catalog<S: RecordSource + ?Sized>(
    source: &S,
    params: &LoadParams,
    category: &str,
    region: Option<&str>,
) -> Result<CatalogTable, CatalogError> {
    info!("loading {category} from {} with {params}", source.describe());

    let raw = source.fetch(&wanted_columns())?;

    let (id_name, id_column) = required(&raw, ID_ALIASES, "id")?;
    let (ra_name, ra_column) = required(&raw, RA_ALIASES, "ra")?;
    let (dec_name, dec_column) = required(&raw, DEC_ALIASES, "dec")?;
    let (z_name, z_column) = required(&raw, REDSHIFT_ALIASES, "redshift")?;

    let ids = id_column.as_i64(id_name)?;
    let ra = ra_column.as_f64(ra_name)?;
    let dec = dec_column.as_f64(dec_name)?;
    let redshift = z_column.as_f64(z_name)?;
    let weight = raw
        .resolve(WEIGHT_ALIASES)
        .map(|(name, column)| column.as_f64(name))
        .transpose()?;

    let total = raw.num_rows();
    let mut seen: HashSet<TargetId, RandomState> =
        HashSet::with_capacity_and_hasher(total, RandomState::default());
    let mut unphysical = 0usize;
    let mut null_ids = 0usize;
    let mut duplicates = 0usize;

    let admitted = (0..total)
        .filter(|&i| {
            let physical = redshift[i].is_finite()
                && redshift[i] >= 0.0
                && ra[i].is_finite()
                && dec[i].is_finite();
            if !physical {
                unphysical += 1;
            }
            physical
        })
        .filter(|&i| {
            within(params.z_range, redshift[i])
                && within(params.ra_range, ra[i])
                && within(params.dec_range, dec[i])
        })
        .filter_map(|i| match ids[i] {
            None => {
                null_ids += 1;
                None
            }
            Some(id) if !seen.insert(id) => {
                duplicates += 1;
                None
            }
            Some(_) => Some(i),
        })
        .collect_vec();

    if unphysical > 0 {
        warn!(
            "{category}: dropped {unphysical} rows with a non-finite position or an unusable redshift"
        );
    }
    if null_ids > 0 {
        warn!("{category}: dropped {null_ids} admissible rows with a null '{id_name}'");
    }
    if duplicates > 0 {
        warn!("{category}: dropped {duplicates} rows repeating an already admitted id");
    }
    debug!(
        "{category}: {} of {total} rows pass the admissibility cuts",
        admitted.len()
    );

    if admitted.is_empty() {
        return Err(CatalogError::EmptyResult {
            category: category.to_string(),
        });
    }

    let chosen = if admitted.len() > params.max_rows {
        info!(
            "{category}: subsampling {} of {} admissible rows",
            params.max_rows,
            admitted.len()
        );
        subsample_positions(admitted.len(), params.max_rows, params.seed)
            .into_iter()
            .map(|k| admitted[k])
            .collect_vec()
    } else {
        admitted
    };

    let rows = chosen
        .into_iter()
        .filter_map(|i| {
            Some(CatalogRecord {
                id: ids[i]?,
                ra: ra[i],
                dec: dec[i],
                redshift: redshift[i],
                weight: weight.as_ref().map(|w| w[i]),
            })
        })
        .collect_vec();

    let table = CatalogTable::from_checked_rows(
        category.to_string(),
        region.map(str::to_string),
        rows,
    );
    if let Some(summary) = table.summary() {
        info!("{category}: {summary}");
    }
    Ok(table)
}

#[cfg(test)]
mod loader_test {
    use super::*;
    use crate::sources::RawColumn;

    fn raw(ids: Vec<Option<i64>>, ra: Vec<f64>, dec: Vec<f64>, z: Vec<f64>) -> RawTable {
        RawTable::new()
            .with_column("TARGETID", RawColumn::Int(ids))
            .unwrap()
            .with_column("RA", RawColumn::Float(ra))
            .unwrap()
            .with_column("DEC", RawColumn::Float(dec))
            .unwrap()
            .with_column("Z", RawColumn::Float(z))
            .unwrap()
    }

    fn grid(n: usize) -> RawTable {
        raw(
            (0..n as i64).map(Some).collect(),
            (0..n).map(|i| (i as f64 * 7.3) % 360.0).collect(),
            (0..n).map(|i| (i as f64 * 1.7) % 60.0 - 30.0).collect(),
            (0..n).map(|i| 0.01 + (i as f64 * 0.013) % 2.0).collect(),
        )
    }

    mod params {
        use super::*;

        #[test]
        fn test_defaults() {
            let p = LoadParams::default();
            assert_eq!(p.max_rows, 50_000);
            assert!(p.ra_range.is_none() && p.dec_range.is_none() && p.z_range.is_none());
            assert!(p.seed.is_none());
        }

        #[test]
        fn test_validation() {
            assert!(LoadParams::builder().max_rows(0).build().is_err());
            assert!(LoadParams::builder().z_range(1.0, 0.5).build().is_err());
            assert!(LoadParams::builder().ra_range(f64::NAN, 10.0).build().is_err());
            assert!(LoadParams::builder()
                .dec_range(f64::NEG_INFINITY, 0.0)
                .build()
                .is_err());
            assert!(LoadParams::builder().z_range(0.8, 0.8).build().is_ok());
        }

        #[test]
        fn test_display() {
            let p = LoadParams::builder()
                .z_range(0.5, 1.5)
                .seed(3)
                .build()
                .unwrap();
            let compact = p.to_string();
            assert!(compact.contains("z=[0.5, 1.5]"));
            assert!(compact.contains("ra=any"));
            assert!(compact.contains("seed=3"));

            let long = format!("{p:#}");
            assert!(long.contains("Catalog Load Parameters"));
            assert!(long.contains("# Redshift cut"));
        }
    }

    #[test]
    fn test_range_filters_are_inclusive() {
        let table = raw(
            vec![Some(1), Some(2), Some(3), Some(4)],
            vec![10.0, 20.0, 30.0, 40.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.5, 1.0, 1.5, 2.0],
        );
        let params = LoadParams::builder()
            .z_range(1.0, 1.5)
            .ra_range(0.0, 35.0)
            .build()
            .unwrap();
        let out = load_catalog(&table, &params, "LRG", None).unwrap();
        assert_eq!(out.ids().collect_vec(), [2, 3]);
    }

    #[test]
    fn test_non_finite_redshift_and_null_ids_dropped() {
        let table = raw(
            vec![Some(1), None, Some(3), Some(4)],
            vec![10.0; 4],
            vec![0.0; 4],
            vec![0.5, 0.6, f64::NAN, f64::INFINITY],
        );
        let out = load_catalog(&table, &LoadParams::default(), "LRG", None).unwrap();
        assert_eq!(out.ids().collect_vec(), [1]);
    }

    #[test]
    fn test_negative_redshift_dropped() {
        let table = raw(
            vec![Some(1), Some(2), Some(3)],
            vec![10.0; 3],
            vec![0.0; 3],
            vec![-0.5, 0.5, 0.0],
        );
        let out = load_catalog(&table, &LoadParams::default(), "LRG", None).unwrap();
        assert_eq!(out.ids().collect_vec(), [2, 3]);
        assert!(out.iter().all(|r| r.redshift >= 0.0));
    }

    #[test]
    fn test_non_finite_position_dropped() {
        let table = raw(
            vec![Some(1), Some(2), Some(3), Some(4)],
            vec![f64::NAN, 20.0, 30.0, f64::INFINITY],
            vec![0.0, f64::NAN, 15.0, 0.0],
            vec![0.5; 4],
        );
        let out = load_catalog(&table, &LoadParams::default(), "LRG", None).unwrap();
        assert_eq!(out.ids().collect_vec(), [3]);

        let all_bad = raw(vec![Some(1)], vec![f64::NAN], vec![0.0], vec![0.5]);
        let err = load_catalog(&all_bad, &LoadParams::default(), "LRG", None).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let table = raw(
            vec![Some(5), Some(5), Some(6)],
            vec![1.0, 2.0, 3.0],
            vec![0.0; 3],
            vec![0.1, 0.2, 0.3],
        );
        let out = load_catalog(&table, &LoadParams::default(), "QSO", None).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[0].ra, 1.0);
    }

    #[test]
    fn test_empty_result() {
        let table = grid(50);
        let params = LoadParams::builder().z_range(5.0, 6.0).build().unwrap();
        let err = load_catalog(&table, &params, "ELG", None).unwrap_err();
        assert_eq!(
            err,
            CatalogError::EmptyResult {
                category: "ELG".into()
            }
        );
        assert!(err.is_no_data());
    }

    #[test]
    fn test_missing_required_column() {
        let table = RawTable::new()
            .with_column("TARGETID", RawColumn::Int(vec![Some(1)]))
            .unwrap()
            .with_column("RA", RawColumn::Float(vec![1.0]))
            .unwrap()
            .with_column("Z", RawColumn::Float(vec![1.0]))
            .unwrap();
        let err = load_catalog(&table, &LoadParams::default(), "LRG", None).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn(msg) if msg.starts_with("dec")));
    }

    #[test]
    fn test_subsample_bound_order_and_seed() {
        let table = grid(1_000);
        let params = LoadParams::builder().max_rows(100).seed(42).build().unwrap();

        let a = load_catalog(&table, &params, "BGS_BRIGHT", Some("SGC")).unwrap();
        let b = load_catalog(&table, &params, "BGS_BRIGHT", Some("SGC")).unwrap();
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);
        assert_eq!(a.region(), Some("SGC"));

        let ids = a.ids().collect_vec();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let other = LoadParams::builder().max_rows(100).seed(43).build().unwrap();
        let c = load_catalog(&table, &other, "BGS_BRIGHT", Some("SGC")).unwrap();
        assert_ne!(a.ids().collect_vec(), c.ids().collect_vec());
    }

    #[test]
    fn test_no_subsample_under_cap() {
        let table = grid(30);
        let params = LoadParams::builder().max_rows(30).build().unwrap();
        let out = load_catalog(&table, &params, "LRG", None).unwrap();
        assert_eq!(out.ids().collect_vec(), (0..30).collect_vec());
    }

    #[test]
    fn test_aliases_and_weight() {
        let table = RawTable::new()
            .with_column("target_id", RawColumn::Float(vec![11.0, 12.0]))
            .unwrap()
            .with_column("ra", RawColumn::Float(vec![1.0, 2.0]))
            .unwrap()
            .with_column("dec", RawColumn::Int(vec![Some(-3), Some(4)]))
            .unwrap()
            .with_column("Z_not4clus", RawColumn::Float(vec![0.7, 0.8]))
            .unwrap()
            .with_column("WEIGHT", RawColumn::Float(vec![0.9, 1.1]))
            .unwrap();
        let out = load_catalog(&table, &LoadParams::default(), "ELG_LOPnotqso", None).unwrap();
        assert!(out.has_weight());
        assert_eq!(out.rows()[1].id, 12);
        assert_eq!(out.rows()[0].dec, -3.0);
        assert_eq!(out.rows()[1].weight, Some(1.1));
    }

    #[test]
    fn test_text_column_is_a_type_error() {
        let table = RawTable::new()
            .with_column("TARGETID", RawColumn::Int(vec![Some(1)]))
            .unwrap()
            .with_column("RA", RawColumn::Text(vec!["12h".into()]))
            .unwrap()
            .with_column("DEC", RawColumn::Float(vec![1.0]))
            .unwrap()
            .with_column("Z", RawColumn::Float(vec![1.0]))
            .unwrap();
        let err = load_catalog(&table, &LoadParams::default(), "LRG", None).unwrap_err();
        assert!(matches!(err, CatalogError::ColumnType { column, .. } if column == "RA"));
    }
}

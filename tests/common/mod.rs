#![allow(dead_code)]

use std::fs::File;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use arrow_array::{
    Array, ArrayRef, Float32Array, Float64Array, Int64Array, RecordBatch, UInt64Array,
};
use arrow_schema::{Field, Schema};
use camino::{Utf8Path, Utf8PathBuf};
use parquet::arrow::ArrowWriter;

use desi_wedge::projection::WedgeSample;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write one record batch to `dir/name` and return the file path.
pub fn write_parquet(dir: &Utf8Path, name: &str, columns: Vec<(&str, ArrayRef)>) -> Utf8PathBuf {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(n, a)| Field::new(*n, a.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, a)| a).collect(),
    )
    .unwrap();

    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    path
}

/// A clustering catalog with `n` rows as DESI ships it: unsigned ids, `f64` positions, `f32`
/// redshifts and a systematic weight.
///
/// Row `i` has `RA = i mod 360`, `DEC = (i mod 60) - 30`, `Z = 0.01 + (i mod 200) / 100`.
pub fn clustering_catalog(dir: &Utf8Path, name: &str, n: usize) -> Utf8PathBuf {
    let ids: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        (0..n as u64).map(|i| 39_627_000_000 + i),
    ));
    let ra: ArrayRef = Arc::new(Float64Array::from_iter_values(
        (0..n).map(|i| (i % 360) as f64),
    ));
    let dec: ArrayRef = Arc::new(Float64Array::from_iter_values(
        (0..n).map(|i| (i % 60) as f64 - 30.0),
    ));
    let z: ArrayRef = Arc::new(Float32Array::from_iter_values(
        (0..n).map(|i| 0.01 + (i % 200) as f32 / 100.0),
    ));
    let weight: ArrayRef = Arc::new(Float64Array::from_iter_values((0..n).map(|_| 1.0)));
    write_parquet(
        dir,
        name,
        vec![
            ("TARGETID", ids),
            ("RA", ra),
            ("DEC", dec),
            ("Z", z),
            ("WEIGHT_SYSTOT", weight),
        ],
    )
}

/// A FastSpecFit-like table for the given ids.
pub fn fastspec_catalog(
    dir: &Utf8Path,
    name: &str,
    ids: &[i64],
    flux: &[f64],
    ivar: &[f64],
) -> Utf8PathBuf {
    let sfr: Vec<Option<f64>> = flux.iter().map(|f| (*f > 0.0).then_some(f / 100.0)).collect();
    write_parquet(
        dir,
        name,
        vec![
            ("TARGETID", Arc::new(Int64Array::from(ids.to_vec())) as ArrayRef),
            ("HALPHA_FLUX", Arc::new(Float64Array::from(flux.to_vec())) as ArrayRef),
            ("HALPHA_FLUX_IVAR", Arc::new(Float64Array::from(ivar.to_vec())) as ArrayRef),
            ("SFR_HALPHA", Arc::new(Float64Array::from(sfr)) as ArrayRef),
        ],
    )
}

pub fn assert_sample_close(actual: &WedgeSample, expected: (f64, f64), epsilon: f64) {
    assert_abs_diff_eq!(actual.x, expected.0, epsilon = epsilon);
    assert_abs_diff_eq!(actual.y, expected.1, epsilon = epsilon);
}

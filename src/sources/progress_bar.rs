//! Progress reporting for long catalog reads.
//!
//! Clustering catalogs routinely hold millions of rows; when the `progress` feature is enabled
//! the Parquet reader drives a bar sized from the file metadata. The bar message shows the time
//! spent on the last record batch next to a smoothed per-batch time,
//! `smoothed ← α·dt + (1–α)·smoothed`, seeded with the first batch.
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Weight of the newest batch in the smoothed batch time.
const SMOOTHING: f64 = 0.2;

/// Row counter for one Parquet read.
pub(crate) struct ReadProgress {
    bar: ProgressBar,
    last_batch: Instant,
    /// Smoothed seconds per batch, `None` until a batch has been read.
    batch_secs: Option<f64>,
    batches: u64,
}

impl ReadProgress {
    pub(crate) fn new(total_rows: u64) -> Self {
        let bar = ProgressBar::new(total_rows.max(1));
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} rows ({percent:>3}%) | {per_sec} | {msg}",
            )
            .expect("indicatif template"),
        );
        bar.enable_steady_tick(Duration::from_millis(200));
        Self {
            bar,
            last_batch: Instant::now(),
            batch_secs: None,
            batches: 0,
        }
    }

    /// Record a batch of `rows` rows read since the previous call.
    pub(crate) fn advance(&mut self, rows: u64) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_batch).as_secs_f64();
        self.last_batch = now;
        self.batches += 1;

        let smoothed = smoothed_batch_secs(self.batch_secs, dt);
        self.batch_secs = Some(smoothed);

        self.bar.set_message(format!(
            "batch {}: {}, smoothed {}",
            self.batches,
            human_secs(dt),
            human_secs(smoothed)
        ));
        self.bar.inc(rows);
    }

    pub(crate) fn finish(self) {
        self.bar.finish_and_clear();
    }
}

fn smoothed_batch_secs(previous: Option<f64>, sample: f64) -> f64 {
    previous.map_or(sample, |prev| SMOOTHING * sample + (1.0 - SMOOTHING) * prev)
}

fn human_secs(secs: f64) -> String {
    if secs < 1e-3 {
        format!("{:.0}µs", secs * 1e6)
    } else if secs < 1.0 {
        format!("{:.0}ms", secs * 1e3)
    } else {
        format!("{secs:.2}s")
    }
}

#[cfg(test)]
mod progress_bar_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_human_secs() {
        assert_eq!(human_secs(253e-6), "253µs");
        assert_eq!(human_secs(0.042), "42ms");
        assert_eq!(human_secs(3.14), "3.14s");
    }

    #[test]
    fn test_smoothing_seeded_by_first_batch() {
        assert_eq!(smoothed_batch_secs(None, 2.0), 2.0);
        assert_relative_eq!(smoothed_batch_secs(Some(1.0), 2.0), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_advance_counts_rows() {
        let mut progress = ReadProgress::new(100);
        progress.advance(40);
        progress.advance(60);
        assert_eq!(progress.batches, 2);
        assert_eq!(progress.bar.position(), 100);
        assert!(progress.batch_secs.is_some());
        progress.finish();
    }
}

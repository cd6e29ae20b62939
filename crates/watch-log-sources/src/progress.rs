use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Outcome counts of a bulk operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
    pub total: usize,
    pub added: usize,
    pub already_present: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Progress tracker for operations that process multiple items.
/// Logs every `progress_interval` items and once at the end, instead of per item.
pub struct ProgressTracker {
    counts: ProgressCounts,
    start_time: std::time::Instant,
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!("Starting operation: {} items to process", total);
        }
        Self {
            counts: ProgressCounts {
                total,
                ..ProgressCounts::default()
            },
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_added(&mut self) {
        self.counts.added += 1;
    }

    pub fn record_already_present(&mut self) {
        self.counts.already_present += 1;
    }

    pub fn record_skipped(&mut self) {
        self.counts.skipped += 1;
    }

    /// Record a failure under a category so the summary can group them
    pub fn record_failed_with_error(&mut self, error_category: &str) {
        self.counts.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    /// `current` is 1-based (idx + 1 from enumerate)
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log < self.progress_interval && current != self.counts.total {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        // Fast local operations finish before a progress line is useful
        if elapsed < 0.5 && current < self.counts.total {
            return;
        }
        info!(
            "Progress: {}/{} | Added: {} | Present: {} | Failed: {} | Skipped: {}",
            current,
            self.counts.total,
            self.counts.added,
            self.counts.already_present,
            self.counts.failed,
            self.counts.skipped
        );
        self.last_progress_log = current;
    }

    pub fn counts(&self) -> &ProgressCounts {
        &self.counts
    }

    /// Log the final summary and hand back the counts
    pub fn finish(self, operation_name: &str) -> ProgressCounts {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let c = &self.counts;
        if c.failed > 0 {
            warn!(
                "{} completed: {} total in {:.1}s | Added: {} | Already present: {} | Failed: {} | Skipped: {}",
                operation_name, c.total, elapsed, c.added, c.already_present, c.failed, c.skipped
            );
            let mut error_entries: Vec<_> = self.error_counts.iter().collect();
            error_entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let error_summary: Vec<String> = error_entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            info!("Error breakdown: {}", error_summary.join(", "));
        } else {
            info!(
                "{} completed: {} total in {:.1}s | Added: {} | Already present: {} | Skipped: {}",
                operation_name, c.total, elapsed, c.added, c.already_present, c.skipped
            );
        }
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut tracker = ProgressTracker::new(4, 2);
        tracker.record_added();
        tracker.record_already_present();
        tracker.record_failed_with_error("io");
        tracker.record_skipped();
        for i in 1..=4 {
            tracker.log_progress(i);
        }
        let counts = tracker.finish("test");
        assert_eq!(
            counts,
            ProgressCounts {
                total: 4,
                added: 1,
                already_present: 1,
                failed: 1,
                skipped: 1,
            }
        );
    }
}

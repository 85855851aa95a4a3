//! Progress reporting for the duplicate detection pipeline.
//!
//! The engine only knows about the [`ProgressCallback`] trait; it never
//! depends on a presentation technology. [`HashProgress`] keeps the shared
//! completed/scheduled counters as atomics so worker threads can update them
//! without locking, and [`Progress`] renders the callbacks as indicatif bars
//! for the command-line tool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline. Implementations are called from
/// worker threads and must be cheap.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("walking", "prehash", "fullhash")
    /// * `items` - Number of items the phase will process (0 if unknown)
    fn on_phase_start(&self, phase: &str, items: usize);

    /// Called each time a hash operation completes or new ones are scheduled.
    ///
    /// # Arguments
    ///
    /// * `completed` - Hash operations finished so far (prefix and full combined)
    /// * `total` - Hash operations scheduled so far (prefix and full combined)
    fn on_progress(&self, completed: u64, total: u64);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Shared hash-operation counters.
///
/// `total` grows as work is scheduled: first by the number of prehashes,
/// then by the number of full hashes once the prefix phase has decided
/// which files survive.
pub struct HashProgress {
    completed: AtomicU64,
    scheduled: AtomicU64,
    callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for HashProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashProgress")
            .field("completed", &self.completed)
            .field("scheduled", &self.scheduled)
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl HashProgress {
    /// Create counters that forward to an optional callback.
    #[must_use]
    pub fn new(callback: Option<Arc<dyn ProgressCallback>>) -> Self {
        Self {
            completed: AtomicU64::new(0),
            scheduled: AtomicU64::new(0),
            callback,
        }
    }

    /// Add `count` operations to the scheduled total.
    pub fn schedule(&self, count: u64) {
        let total = self.scheduled.fetch_add(count, Ordering::AcqRel) + count;
        if let Some(ref callback) = self.callback {
            callback.on_progress(self.completed.load(Ordering::Acquire), total);
        }
    }

    /// Record one finished operation, successful or not.
    pub fn complete_one(&self) {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(ref callback) = self.callback {
            callback.on_progress(completed, self.scheduled.load(Ordering::Acquire));
        }
    }

    /// Current `(completed, total)` pair.
    #[must_use]
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.completed.load(Ordering::Acquire),
            self.scheduled.load(Ordering::Acquire),
        )
    }

    /// The callback these counters forward to, if any.
    #[must_use]
    pub fn callback(&self) -> Option<&Arc<dyn ProgressCallback>> {
        self.callback.as_ref()
    }
}

/// Progress reporter using indicatif.
///
/// Shows a spinner while walking and a single hashing bar whose length
/// grows as the full-hash phase schedules more work.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupehunt::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, _items: usize) {
        if self.quiet {
            return;
        }

        match phase {
            "walking" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                if let Ok(mut walking) = self.walking.lock() {
                    *walking = Some(pb);
                }
            }
            "prehash" | "fullhash" => {
                let message = if phase == "prehash" {
                    "Prefix hashing"
                } else {
                    "Full hashing"
                };
                if let Ok(mut hashing) = self.hashing.lock() {
                    let pb = hashing.get_or_insert_with(|| {
                        let pb = self.multi.add(ProgressBar::new(0));
                        pb.set_style(Self::hashing_style());
                        pb
                    });
                    pb.set_message(message);
                }
            }
            _ => {}
        }
    }

    fn on_progress(&self, completed: u64, total: u64) {
        if self.quiet {
            return;
        }
        if let Ok(hashing) = self.hashing.lock() {
            if let Some(ref pb) = *hashing {
                pb.set_length(total);
                pb.set_position(completed);
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        match phase {
            "walking" => {
                if let Some(pb) = self.walking.lock().ok().and_then(|mut w| w.take()) {
                    pb.finish_with_message("Walking complete");
                }
            }
            "fullhash" => {
                if let Some(pb) = self.hashing.lock().ok().and_then(|mut h| h.take()) {
                    pb.finish_with_message("Hashing complete");
                }
            }
            _ => {}
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Ok(walking) = self.walking.lock() {
            if let Some(ref pb) = *walking {
                pb.set_message(message.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressCallback for Recorder {
        fn on_phase_start(&self, _phase: &str, _items: usize) {}
        fn on_progress(&self, completed: u64, total: u64) {
            self.updates.lock().unwrap().push((completed, total));
        }
        fn on_phase_end(&self, _phase: &str) {}
    }

    #[test]
    fn test_hash_progress_counts() {
        let recorder = Arc::new(Recorder::default());
        let progress = HashProgress::new(Some(recorder.clone() as Arc<dyn ProgressCallback>));

        progress.schedule(3);
        progress.complete_one();
        progress.complete_one();
        progress.schedule(2);
        progress.complete_one();

        assert_eq!(progress.snapshot(), (3, 5));
        assert_eq!(
            *recorder.updates.lock().unwrap(),
            vec![(0, 3), (1, 3), (2, 3), (2, 5), (3, 5)]
        );
    }

    #[test]
    fn test_hash_progress_without_callback() {
        let progress = HashProgress::new(None);
        progress.schedule(1);
        progress.complete_one();
        assert_eq!(progress.snapshot(), (1, 1));
        assert!(progress.callback().is_none());
    }

    #[test]
    fn test_hash_progress_concurrent_updates() {
        use rayon::prelude::*;

        let progress = HashProgress::new(None);
        progress.schedule(1000);
        (0..1000).into_par_iter().for_each(|_| progress.complete_one());

        assert_eq!(progress.snapshot(), (1000, 1000));
    }

    #[test]
    fn test_quiet_progress_ignores_events() {
        let progress = Progress::new(true);
        progress.on_phase_start("prehash", 10);
        progress.on_progress(5, 10);
        progress.on_phase_end("fullhash");
        assert!(progress.hashing.lock().unwrap().is_none());
    }
}

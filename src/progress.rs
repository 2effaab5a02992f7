//! Progress reporting infrastructure

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// CLI progress report of ongoing operations
///
/// To avoid corrupted terminal output, you should not write anything to stderr
/// yourself as long as a report is being displayed. Please use logs for debug
/// messages.
#[derive(Clone, Debug, Default)]
pub struct ProgressReport(MultiProgress);
//
impl ProgressReport {
    /// Prepare to report progress on the cli
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress report that is never displayed
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
    }

    /// Prepare to report on a new asynchronous operation
    pub fn add(
        &self,
        what: impl Into<Cow<'static, str>>,
        config: ProgressConfig,
    ) -> ProgressTracker {
        let ProgressConfig {
            initial_work,
            can_add_work,
        } = config;
        let style_trailer = match initial_work {
            Work::Steps(_) => "{pos}/{len}",
            Work::Bytes(_) => "{decimal_bytes}/{decimal_total_bytes} ({decimal_bytes_per_sec})",
        };
        let bar = ProgressBar::with_draw_target(
            Some(initial_work.into()),
            ProgressDrawTarget::hidden(),
        )
        .with_prefix(what)
        .with_style(
            ProgressStyle::with_template(&format!("{{prefix}} {{wide_bar}} {style_trailer}"))
                .expect("all styles above should be valid indicatif styles"),
        );
        let added = u64::from(initial_work) > 0;
        if added {
            self.0.add(bar.clone());
        }
        ProgressTracker {
            bar,
            report: self.0.clone(),
            added: Arc::new(AtomicBool::new(added)),
            upcoming: Arc::new(AtomicBool::new(can_add_work)),
        }
    }
}

/// Progress bar configuration
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ProgressConfig {
    /// Initial length of the progress bar
    initial_work: Work,

    /// Can add more work after initial configuration
    can_add_work: bool,
}
//
impl ProgressConfig {
    /// Default configuration, with some initial amount of work
    pub fn new(initial_work: Work) -> Self {
        Self {
            initial_work,
            can_add_work: false,
        }
    }

    /// Enable addition of work after initial configuration
    pub fn allow_adding_work(self) -> Self {
        Self {
            can_add_work: true,
            ..self
        }
    }
}

/// Work whose progression can be tracked
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Work {
    /// Steps to be taken, e.g. data files to be opened
    Steps(usize),

    /// Bytes to be read
    Bytes(u64),
}
//
impl From<Work> for u64 {
    fn from(value: Work) -> Self {
        match value {
            Work::Steps(s) => s as u64,
            Work::Bytes(b) => b,
        }
    }
}

/// Mechanism to track progress
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    /// Progress bar for this specific process
    bar: ProgressBar,

    /// Underlying process report
    report: MultiProgress,

    /// Truth that the progress bar has already been added to the report
    added: Arc<AtomicBool>,

    /// Truth that more work can still be added to this progress bar
    upcoming: Arc<AtomicBool>,
}
//
impl ProgressTracker {
    /// Show that a certain amount of progress has been made
    ///
    /// Returns truth that the progress bar has reached its maximum value
    pub fn make_progress(&self, progress: u64) -> bool {
        self.bar.inc(progress);
        let current = self.bar.position();
        let max = self.bar.length().unwrap_or(0);
        if current > max {
            // Can happen if a server lied about its content length
            log::debug!(
                "Progress bar {:?} went past its end ({current}/{max})",
                self.bar.prefix()
            );
        }

        // Hide progress bar once done
        let finished = current >= max && !self.upcoming.load(Ordering::Acquire);
        if finished {
            self.bar.finish_and_clear();
            self.report.remove(&self.bar);
        }
        finished
    }

    /// Increment the amount of work that remains to be done
    ///
    /// Only allowed if enabled in [`ProgressConfig`]. Call
    /// [`done_adding_work()`](Self::done_adding_work) once you know no further
    /// work will be coming.
    pub fn add_work(&self, remaining: u64) {
        debug_assert!(
            self.upcoming.load(Ordering::Acquire),
            "should not add work after done_adding_work"
        );
        if remaining > 0 && !self.added.swap(true, Ordering::AcqRel) {
            self.report.add(self.bar.clone());
        }
        self.bar.inc_length(remaining);
    }

    /// Promise that add_work will not be called anymore
    ///
    /// This allows for the progress bar to be hidden once full.
    pub fn done_adding_work(&self) {
        let was_upcoming = self.upcoming.swap(false, Ordering::Release);
        debug_assert!(was_upcoming, "should only stop adding work once");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_finish_at_length() {
        let report = ProgressReport::hidden();
        let files = report.add("Opening data files", ProgressConfig::new(Work::Steps(2)));
        assert!(!files.make_progress(1));
        assert!(files.make_progress(1));
    }

    #[test]
    fn growable_bar_waits_for_last_work() {
        let report = ProgressReport::hidden();
        let bytes = report.add(
            "Reading data files",
            ProgressConfig::new(Work::Bytes(0)).allow_adding_work(),
        );
        bytes.add_work(10);
        assert!(!bytes.make_progress(10));
        bytes.add_work(5);
        bytes.done_adding_work();
        assert!(bytes.make_progress(5));
    }
}

//! Stage Progress Counter
//!
//! Thread-safe counter the pipeline workers bump as they finish items.
//! Prints periodic status lines rather than a live bar; output stays
//! readable when interleaved with log lines.

use console::style;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How many completions between status lines.
const REPORT_EVERY: usize = 25;

pub struct ProgressCounter {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl ProgressCounter {
    pub fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            done: AtomicUsize::new(0),
        }
    }

    /// Record one completed item.
    pub fn inc(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done == self.total || done % REPORT_EVERY == 0 {
            eprintln!(
                "  {} {}/{}",
                style(self.label).dim(),
                done,
                self.total
            );
        }
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        eprintln!(
            "{} {}: {} of {} items",
            style("✓").green(),
            self.label,
            self.done(),
            self.total
        );
    }
}

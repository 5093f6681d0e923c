//! Merging of contiguous exceeding samples into [`WarnInterval`]s.

use crate::types::WarnInterval;
use tracing::{debug, warn};

/// An open run of samples sharing the same non-zero class.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    class: usize,
    /// Samples in the run that carry a timestamp.
    timed: u64,
    peak: f64,
}

/// Accumulates classified samples in index order and emits one interval per
/// maximal run of equal, non-zero class.
///
/// Class `0` means "not exceeding". Alarm scans use a single class `1`;
/// fuel-flow scans use the tier number so a tier change closes the run.
#[derive(Debug)]
pub(crate) struct RunMerger {
    scan: &'static str,
    interval_secs: u64,
    current: Option<Run>,
    out: Vec<WarnInterval>,
    untimed: usize,
}

impl RunMerger {
    pub(crate) fn new(scan: &'static str, interval_secs: u16) -> Self {
        Self {
            scan,
            interval_secs: u64::from(interval_secs),
            current: None,
            out: Vec::new(),
            untimed: 0,
        }
    }

    /// Feed the next sample.
    ///
    /// `value` is folded into the run's peak; alarm scans pass their limit so
    /// the emitted value is the threshold.
    pub(crate) fn push(&mut self, index: usize, timed: bool, class: usize, value: f64) {
        if self.current.is_some_and(|r| r.class != class) {
            self.close();
        }
        if class == 0 {
            return;
        }
        if !timed {
            debug!(scan = self.scan, index, "sample without timestamp excluded from duration");
            self.untimed += 1;
        }
        let run = self.current.get_or_insert(Run {
            start: index,
            class,
            timed: 0,
            peak: value,
        });
        run.timed += u64::from(timed);
        if value > run.peak {
            run.peak = value;
        }
    }

    fn close(&mut self) {
        if let Some(run) = self.current.take() {
            self.out.push(WarnInterval {
                start_index: run.start,
                duration_secs: run.timed.saturating_mul(self.interval_secs),
                value: run.peak,
            });
        }
    }

    pub(crate) fn finish(mut self) -> Vec<WarnInterval> {
        self.close();
        if self.untimed > 0 {
            warn!(
                scan = self.scan,
                samples = self.untimed,
                "samples without timestamp excluded from durations"
            );
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(classes: &[usize]) -> Vec<WarnInterval> {
        let mut m = RunMerger::new("test", 6);
        for (i, &c) in classes.iter().enumerate() {
            m.push(i, true, c, 1.0);
        }
        m.finish()
    }

    #[test]
    fn no_exceedance_no_interval() {
        assert!(merge(&[0, 0, 0]).is_empty());
        assert!(merge(&[]).is_empty());
    }

    #[test]
    fn disjoint_runs() {
        let out = merge(&[1, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1]);
        assert_eq!(out.len(), 3);
        assert_eq!((out[0].start_index, out[0].duration_secs), (0, 12));
        assert_eq!((out[1].start_index, out[1].duration_secs), (3, 6));
        // run reaching the end of the sequence is closed too
        assert_eq!((out[2].start_index, out[2].duration_secs), (6, 30));
    }

    #[test]
    fn class_change_splits_run() {
        let out = merge(&[1, 1, 2, 2, 1]);
        let starts: Vec<_> = out.iter().map(|w| w.start_index).collect();
        assert_eq!(starts, vec![0, 2, 4]);
    }

    #[test]
    fn peak_and_untimed_samples() {
        let mut m = RunMerger::new("test", 6);
        m.push(0, true, 1, 3.0);
        m.push(1, false, 1, 9.0);
        m.push(2, true, 1, 4.0);
        let out = m.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration_secs, 12);
        assert_eq!(out[0].value, 9.0);
    }

    #[test]
    fn long_run_at_longest_interval() {
        let mut m = RunMerger::new("test", u16::MAX);
        for i in 0..65_600 {
            m.push(i, true, 1, 250.0);
        }
        let out = m.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration_secs, 65_600 * u64::from(u16::MAX));
    }
}

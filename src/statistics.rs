//! Timings of single canonicalizations.

use std::{fmt, time::Duration};

/// Where the time of one invocation went. Only meant
/// for benchmarking, the labelling itself is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanonTimings {
    /// Validating the input and filling the engine buffers.
    pub build: Duration,
    /// The engine call.
    pub canonicalize: Duration,
}

impl CanonTimings {
    pub fn total(&self) -> Duration {
        self.build + self.canonicalize
    }
}

impl fmt::Display for CanonTimings {
    #[cfg(not(tarpaulin_include))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "build took {:?}, canonicalize took {:?}",
            self.build, self.canonicalize
        )
    }
}

/// Accumulates the timings of a batch.
#[derive(Debug, Default)]
pub struct TimingStatistics {
    pub runs: usize,
    pub failures: usize,
    pub build: Duration,
    pub canonicalize: Duration,
    pub max_canonicalize: Duration,
}

impl TimingStatistics {
    pub fn log_run<E>(&mut self, run: &Result<CanonTimings, E>) {
        self.runs += 1;
        match run {
            Ok(timings) => {
                self.build += timings.build;
                self.canonicalize += timings.canonicalize;
                self.max_canonicalize = self.max_canonicalize.max(timings.canonicalize);
            }
            Err(_) => self.failures += 1,
        }
    }
}

impl fmt::Display for TimingStatistics {
    #[cfg(not(tarpaulin_include))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let successes = (self.runs - self.failures).max(1) as u32;
        writeln!(f, "runs: {}, failures: {}", self.runs, self.failures)?;
        writeln!(
            f,
            "build: {:?} total, {:?} mean",
            self.build,
            self.build / successes
        )?;
        write!(
            f,
            "canonicalize: {:?} total, {:?} mean, {:?} max",
            self.canonicalize,
            self.canonicalize / successes,
            self.max_canonicalize
        )
    }
}

//! Debug, statistics and profiling module

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Rolling timing statistics over the last N samples
#[derive(Debug, Clone)]
pub struct TimingStats {
    /// Sample history for averaging
    samples: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Samples per second over the history window
    rate: f32,
    /// Average sample time in milliseconds
    avg_ms: f32,
    /// Minimum sample time in milliseconds
    min_ms: f32,
    /// Maximum sample time in milliseconds
    max_ms: f32,
    /// Total samples ever recorded
    total: u64,
}

impl TimingStats {
    /// Default history length
    pub const DEFAULT_SAMPLES: usize = 120;

    /// Create a new tracker
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_SAMPLES)
    }

    /// Create a tracker keeping `max_samples` of history
    pub fn with_capacity(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            rate: 0.0,
            avg_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
            total: 0,
        }
    }

    /// Record one sample
    pub fn record(&mut self, delta: Duration) {
        self.total += 1;

        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(delta);

        self.update_stats();
    }

    fn update_stats(&mut self) {
        if self.samples.is_empty() {
            return;
        }

        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for &dt in &self.samples {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        let count = self.samples.len() as f32;
        let total_secs = total.as_secs_f32();

        // Guard against division by zero
        if total_secs > 0.0 {
            self.avg_ms = (total_secs / count) * 1000.0;
            self.rate = count / total_secs;
        } else {
            self.avg_ms = 0.0;
            self.rate = 0.0;
        }

        self.min_ms = min.as_secs_f32() * 1000.0;
        self.max_ms = max.as_secs_f32() * 1000.0;
    }

    /// Samples per second (FPS when fed frame deltas)
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Average sample in milliseconds
    pub fn avg_ms(&self) -> f32 {
        self.avg_ms
    }

    /// Minimum sample in milliseconds
    pub fn min_ms(&self) -> f32 {
        self.min_ms
    }

    /// Maximum sample in milliseconds
    pub fn max_ms(&self) -> f32 {
        self.max_ms
    }

    /// Total samples recorded
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Format as a frame-rate line
    pub fn format_frame(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2}ms (min: {:.2}, max: {:.2})",
            self.rate, self.avg_ms, self.min_ms, self.max_ms
        )
    }

    /// Format as a named CPU scope line
    pub fn format_scope(&self, name: &str) -> String {
        format!(
            "{name}: {:.3}ms (min: {:.3}, max: {:.3})",
            self.avg_ms, self.min_ms, self.max_ms
        )
    }
}

impl Default for TimingStats {
    fn default() -> Self {
        Self::new()
    }
}

/// CPU time profiler keyed by static scope names
#[derive(Debug)]
pub struct Profiler {
    enabled: bool,
    scopes: BTreeMap<&'static str, TimingStats>,
}

impl Profiler {
    /// Create an enabled profiler
    pub fn new() -> Self {
        Self {
            enabled: true,
            scopes: BTreeMap::new(),
        }
    }

    /// Enable or disable recording
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether recording is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start timing a named CPU block.
    ///
    /// The block ends when the returned guard is dropped, so early returns
    /// are still measured.
    pub fn scope(&mut self, name: &'static str) -> TimeBlock<'_> {
        TimeBlock {
            profiler: self,
            name,
            start: Instant::now(),
        }
    }

    /// Record an elapsed time for a scope directly
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        self.scopes.entry(name).or_default().record(elapsed);
    }

    /// Stats for a scope, if it has been recorded
    pub fn stats(&self, name: &str) -> Option<&TimingStats> {
        self.scopes.get(name)
    }

    /// One formatted line per scope, sorted by name
    pub fn report_lines(&self) -> Vec<String> {
        self.scopes
            .iter()
            .map(|(name, stats)| stats.format_scope(name))
            .collect()
    }

    /// Forget all recorded scopes
    pub fn reset(&mut self) {
        self.scopes.clear();
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for a profiled block
pub struct TimeBlock<'a> {
    profiler: &'a mut Profiler,
    name: &'static str,
    start: Instant,
}

impl Drop for TimeBlock<'_> {
    fn drop(&mut self) {
        self.profiler.record(self.name, self.start.elapsed());
    }
}

/// Debug overlay information
#[derive(Debug, Default)]
pub struct DebugInfo {
    /// Frame statistics
    pub frame_stats: TimingStats,
    /// Custom debug lines
    custom_lines: Vec<String>,
}

impl DebugInfo {
    /// Create new debug info
    pub fn new() -> Self {
        Self {
            frame_stats: TimingStats::new(),
            custom_lines: Vec::new(),
        }
    }

    /// Add a custom debug line
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.custom_lines.push(line.into());
    }

    /// Frame stats, custom lines, then profiler scopes
    pub fn get_all_lines(&self, profiler: &Profiler) -> Vec<String> {
        let mut lines = vec![self.frame_stats.format_frame()];
        lines.extend(self.custom_lines.iter().cloned());
        lines.extend(profiler.report_lines());
        lines
    }

    /// Record a frame
    pub fn record_frame(&mut self, delta: Duration) {
        self.frame_stats.record(delta);
    }
}

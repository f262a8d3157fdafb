//! Process statistics read from `/proc/self`.
//!
//! Each file is read independently; whatever cannot be read (non-Linux
//! hosts, restricted procfs) is left out of the scrape.

use std::path::PathBuf;

use crate::application::ports::SampleSource;
use crate::domain::metrics::{MetricDesc, Sample};

/// Clock ticks per second used by `/proc/<pid>/stat` (`USER_HZ`).
///
/// Linux fixes `USER_HZ` at 100 for userspace on every mainstream
/// architecture, independent of the kernel's internal `CONFIG_HZ`.
/// Kernels built with another value would scale CPU and start times.
const CLOCK_TICKS: f64 = 100.0;

/// Total user and system CPU time.
pub static CPU_SECONDS: MetricDesc = MetricDesc::new(
    "process_cpu_seconds_total",
    "Total user and system CPU time spent in seconds",
    &[],
);

/// Resident memory size.
pub static RESIDENT_MEMORY: MetricDesc = MetricDesc::new(
    "process_resident_memory_bytes",
    "Resident memory size in bytes",
    &[],
);

/// Virtual memory size.
pub static VIRTUAL_MEMORY: MetricDesc = MetricDesc::new(
    "process_virtual_memory_bytes",
    "Virtual memory size in bytes",
    &[],
);

/// Process start time.
pub static START_TIME: MetricDesc = MetricDesc::new(
    "process_start_time_seconds",
    "Start time of the process since unix epoch in seconds",
    &[],
);

/// Open file descriptors.
pub static OPEN_FDS: MetricDesc = MetricDesc::new(
    "process_open_fds",
    "Number of open file descriptors",
    &[],
);

/// File descriptor limit.
pub static MAX_FDS: MetricDesc = MetricDesc::new(
    "process_max_fds",
    "Maximum number of open file descriptors",
    &[],
);

/// CPU and start time fields of `/proc/<pid>/stat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatFields {
    /// User plus system time, in seconds.
    pub cpu_seconds: f64,
    /// Start time after boot, in seconds.
    pub start_after_boot: f64,
}

/// Collects process metrics from procfs.
#[derive(Debug, Clone)]
pub struct ProcessCollector {
    proc_root: PathBuf,
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCollector {
    /// Collector for the current process.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Collector reading from another procfs mount (tests).
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
        }
    }

    fn read(&self, rel: &str) -> Option<String> {
        let path = self.proc_root.join(rel);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping process metric source");
                None
            }
        }
    }

    fn count_fds(&self) -> Option<usize> {
        let path = self.proc_root.join("self/fd");
        std::fs::read_dir(&path)
            .map(Iterator::count)
            .map_err(|e| {
                tracing::debug!(path = %path.display(), error = %e, "Skipping open fd count");
            })
            .ok()
    }
}

impl SampleSource for ProcessCollector {
    fn name(&self) -> &'static str {
        "process"
    }

    #[allow(clippy::cast_precision_loss)]
    fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();

        let stat = self.read("self/stat").and_then(|s| parse_stat(&s));
        if let Some(stat) = stat {
            samples.push(Sample::unlabeled(&CPU_SECONDS, stat.cpu_seconds));
            if let Some(boot) = self.read("stat").and_then(|s| parse_boot_time(&s)) {
                samples.push(Sample::unlabeled(&START_TIME, boot + stat.start_after_boot));
            }
        }

        if let Some(status) = self.read("self/status") {
            if let Some(rss) = parse_status_kib(&status, "VmRSS") {
                samples.push(Sample::unlabeled(&RESIDENT_MEMORY, rss as f64 * 1024.0));
            }
            if let Some(vsize) = parse_status_kib(&status, "VmSize") {
                samples.push(Sample::unlabeled(&VIRTUAL_MEMORY, vsize as f64 * 1024.0));
            }
        }

        if let Some(open) = self.count_fds() {
            samples.push(Sample::unlabeled(&OPEN_FDS, open as f64));
        }

        if let Some(max) = self.read("self/limits").and_then(|s| parse_max_open_files(&s)) {
            samples.push(Sample::unlabeled(&MAX_FDS, max));
        }

        samples
    }
}

/// Parse utime, stime and starttime out of a `/proc/<pid>/stat` line.
///
/// The command name may contain spaces and parentheses, so fields are
/// counted from the last `)`.
#[must_use]
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // fields[0] is the state (field 3 of the man page)
    let utime: f64 = fields.get(11)?.parse().ok()?;
    let stime: f64 = fields.get(12)?.parse().ok()?;
    let start: f64 = fields.get(19)?.parse().ok()?;
    Some(StatFields {
        cpu_seconds: (utime + stime) / CLOCK_TICKS,
        start_after_boot: start / CLOCK_TICKS,
    })
}

/// Parse the `btime` line of `/proc/stat`.
#[must_use]
pub fn parse_boot_time(content: &str) -> Option<f64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("btime"))
        .and_then(|v| v.trim().parse().ok())
}

/// Parse a `kB` field of `/proc/<pid>/status`.
#[must_use]
pub fn parse_status_kib(content: &str, field: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key != field {
            return None;
        }
        value.split_whitespace().next()?.parse().ok()
    })
}

/// Parse the soft "Max open files" limit of `/proc/<pid>/limits`.
#[must_use]
pub fn parse_max_open_files(content: &str) -> Option<f64> {
    let line = content.lines().find(|l| l.starts_with("Max open files"))?;
    let soft = line["Max open files".len()..].split_whitespace().next()?;
    if soft == "unlimited" {
        return Some(f64::INFINITY);
    }
    soft.parse().ok()
}

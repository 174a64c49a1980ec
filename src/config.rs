//! Command-line arguments and the immutable sync configuration built from them.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::fs::LocalFs;
use crate::sync::exclude::ExcludePatterns;

/// Delay between two comparison passes inside a cycle.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(
    name = "dirmirror",
    version,
    about = "Mirror a source folder onto a destination folder at a fixed interval",
    after_help = "Example: dirmirror ./src ./backup 0.5 ./sync.log"
)]
pub struct Args {
    /// path/to/source/folder
    pub source: String,

    /// path/to/destination/folder
    pub destination: String,

    /// Synchronization interval in minutes (fractions allowed)
    #[arg(allow_negative_numbers = true)]
    pub interval: f64,

    /// path/to/log/file ('*.log')
    pub log_file: String,

    /// Delay between comparison passes, in milliseconds
    #[arg(long, value_name = "MILLIS", default_value_t = 500)]
    pub tick: u64,

    /// Extra name pattern to leave out of change detection (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for one synchronizer process.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub source: String,
    pub destination: String,
    /// Time between two full reconciliations.
    pub interval: Duration,
    /// Time between two comparison passes.
    pub tick: Duration,
    pub excludes: ExcludePatterns,
    pub log_path: PathBuf,
}

impl SyncConfig {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        interval: Duration,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: LocalFs::normalize_separators(&source.into()),
            destination: LocalFs::normalize_separators(&destination.into()),
            interval,
            tick: DEFAULT_TICK,
            excludes: ExcludePatterns::with_defaults(),
            log_path: log_path.into(),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_excludes(mut self, excludes: ExcludePatterns) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        let interval = interval_from_minutes(args.interval)?;
        if args.tick == 0 {
            return Err(SyncError::InvalidTick { millis: args.tick });
        }

        let mut excludes = ExcludePatterns::with_defaults();
        for pattern in &args.ignore {
            excludes.add_pattern(pattern)?;
        }

        let log_path = LocalFs::normalize_separators(&args.log_file);

        Ok(Self::new(&*args.source, &*args.destination, interval, log_path)
            .with_tick(Duration::from_millis(args.tick))
            .with_excludes(excludes))
    }
}

/// Convert a (possibly fractional) number of minutes to a duration.
pub fn interval_from_minutes(minutes: f64) -> Result<Duration> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(SyncError::InvalidInterval { value: minutes });
    }
    Duration::try_from_secs_f64(minutes * 60.0).map_err(|_| SyncError::InvalidInterval { value: minutes })
}

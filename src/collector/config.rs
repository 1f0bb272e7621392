//! Collection run configuration

use std::time::Duration;

use crate::notify::DEFAULT_NOTIFY_TIMEOUT;
use crate::schedule::FetchPolicy;
use crate::store::FileNaming;
use crate::Mode;

/// Settings for a [`Collector`](super::Collector)
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Modes to collect, in planning order
    pub modes: Vec<Mode>,
    /// Fetch modes concurrently instead of one after another
    pub parallel: bool,
    /// Season file naming scheme
    pub naming: FileNaming,
    /// Value of `metadata.automated` in written artifacts
    pub automated: bool,
    /// Bound on each notification call
    pub notify_timeout: Duration,
    /// Which modes the scheduler lets through
    pub fetch_policy: FetchPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            modes: Mode::ALL.to_vec(),
            parallel: true,
            naming: FileNaming::default(),
            automated: true,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            fetch_policy: FetchPolicy::default(),
        }
    }
}

impl CollectorConfig {
    /// Collect only these modes; duplicates are dropped
    pub fn with_modes(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        let mut unique = Vec::new();
        for mode in modes {
            if !unique.contains(&mode) {
                unique.push(mode);
            }
        }
        self.modes = unique;
        self
    }

    /// Fetch modes one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use a file naming scheme
    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Mark written artifacts as automated or manual
    pub fn with_automated(mut self, automated: bool) -> Self {
        self.automated = automated;
        self
    }

    /// Bound each notification call
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}

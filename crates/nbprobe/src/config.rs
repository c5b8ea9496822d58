//! Page object configuration.
//!
//! Defaults reproduce the timings the JupyterLab UI needs on a developer
//! machine. CI runs usually only raise the timeouts, either from a YAML file
//! or through `NBPROBE_*` environment variables.

use crate::result::{LabError, LabResult};
use crate::wait::{ErrorPolicy, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default JupyterLab URL
pub const DEFAULT_LAB_URL: &str = "http://127.0.0.1:9999/lab";

/// Environment variable overriding [`LabConfig::lab_url`]
pub const ENV_LAB_URL: &str = "NBPROBE_LAB_URL";

/// Environment variable overriding [`LabConfig::wait_timeout_ms`]
pub const ENV_WAIT_TIMEOUT_MS: &str = "NBPROBE_WAIT_TIMEOUT_MS";

/// Configuration for [`LabPage`](crate::lab::LabPage)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// JupyterLab application URL
    pub lab_url: String,
    /// Budget for ordinary waits
    pub wait_timeout_ms: u64,
    /// Polling interval for all waits
    pub poll_interval_ms: u64,
    /// Budget for slow transitions (kernel shutdown, completer, tooltip)
    pub long_wait_timeout_ms: u64,
    /// Pause after file-browser navigation steps
    pub navigation_settle_ms: u64,
    /// Pause after a notebook is closed and its kernel halted
    pub halt_settle_ms: u64,
    /// Pause before reading outputs without waiting for them
    pub output_pause_ms: u64,
    /// Width added to the window after opening a notebook
    pub window_width_increase: u32,
    /// Title of the JupyterLab browser window
    pub window_title: String,
    /// Command palette label of the options window
    pub options_palette_label: String,
    /// How waits treat predicate errors
    pub error_policy: ErrorPolicy,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            lab_url: DEFAULT_LAB_URL.to_string(),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            long_wait_timeout_ms: 10_000,
            navigation_settle_ms: 1_500,
            halt_settle_ms: 5_000,
            output_pause_ms: 1_000,
            window_width_increase: 200,
            window_title: "JupyterLab".to_string(),
            options_palette_label: "BeakerX Options".to_string(),
            error_policy: ErrorPolicy::RetryTransient,
        }
    }
}

impl LabConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set lab URL
    #[must_use]
    pub fn with_lab_url(mut self, url: impl Into<String>) -> Self {
        self.lab_url = url.into();
        self
    }

    /// Set ordinary wait budget
    #[must_use]
    pub const fn with_wait_timeout(mut self, ms: u64) -> Self {
        self.wait_timeout_ms = ms;
        self
    }

    /// Set slow-transition wait budget
    #[must_use]
    pub const fn with_long_wait_timeout(mut self, ms: u64) -> Self {
        self.long_wait_timeout_ms = ms;
        self
    }

    /// Set poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set all settle pauses at once
    #[must_use]
    pub const fn with_settle_pauses(
        mut self,
        navigation_ms: u64,
        halt_ms: u64,
        output_ms: u64,
    ) -> Self {
        self.navigation_settle_ms = navigation_ms;
        self.halt_settle_ms = halt_ms;
        self.output_pause_ms = output_ms;
        self
    }

    /// Set error policy
    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Wait options for ordinary waits
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            error_policy: self.error_policy,
        }
    }

    /// Parse from YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> LabResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> LabResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> LabResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `NBPROBE_*` overrides from the process environment
    pub fn with_env_overrides(self) -> LabResult<Self> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> LabResult<Self> {
        if let Some(url) = lookup(ENV_LAB_URL) {
            self.lab_url = url;
        }
        if let Some(raw) = lookup(ENV_WAIT_TIMEOUT_MS) {
            self.wait_timeout_ms = raw.trim().parse().map_err(|_| LabError::Config {
                message: format!(
                    "{ENV_WAIT_TIMEOUT_MS} must be a number of milliseconds, got {raw:?}"
                ),
            })?;
        }
        Ok(self)
    }
}

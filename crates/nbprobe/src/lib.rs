//! nbprobe: page objects and UI synchronization for JupyterLab browser tests
//!
//! Notebook UIs render asynchronously: menus open after an animation, the
//! kernel status icon flips when execution ends, outputs arrive whenever the
//! kernel sends them. nbprobe turns "wait until the UI reaches state S" into
//! bounded polls and wraps the recurring interactions in a page object.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    NBPROBE Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Test       │    │ LabPage    │    │ LabDriver  │            │
//! │   │ (Rust)     │───►│ + Waiter   │───►│ Chromium / │            │
//! │   │            │    │            │    │ Scripted   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use nbprobe::{BrowserConfig, ChromiumDriver, LabConfig, LabPage};
//!
//! let driver = ChromiumDriver::launch(&BrowserConfig::default()).await?;
//! let lab = LabPage::with_config(driver, LabConfig::default().with_env_overrides()?);
//! lab.open_notebook("/doc/demo.ipynb", None).await?;
//! lab.click_run_all_cells().await?;
//! let cell = lab.code_cell(0).await?;
//! assert!(!lab.stdout_outputs(&cell).await?.is_empty());
//! lab.close_and_halt_notebook().await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Chromium driver over CDP (`browser` feature) and browser settings
pub mod browser;
/// Page object configuration
pub mod config;
/// Browser automation capability
pub mod driver;
/// JupyterLab page object
pub mod lab;
/// In-memory drivers for unit tests
pub mod mock;
/// Page Object Model trait
pub mod page_object;
/// Error types
pub mod result;
/// Element selectors
pub mod selector;
/// Bounded polling waits
pub mod wait;

pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::LabConfig;
pub use driver::{ElementHandle, Key, LabDriver, WindowSize};
pub use lab::{LabPage, OutputKind};
pub use page_object::PageObject;
pub use result::{LabError, LabResult};
pub use selector::Selector;
pub use wait::{
    wait_for_count, wait_for_displayed, wait_for_enabled, wait_for_present,
    wait_for_selector_enabled, CountCondition, ErrorPolicy, WaitOptions, WaitResult, WaitState,
    Waiter, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

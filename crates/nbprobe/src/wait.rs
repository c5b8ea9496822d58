//! UI synchronization waits.
//!
//! The notebook UI renders, changes kernel status and animates dialogs on
//! its own schedule. Test code turns "wait until the UI reaches state S" into
//! a bounded polling loop: evaluate a predicate, sleep one poll interval,
//! repeat until the predicate holds or the budget runs out.
//!
//! Only the waiting is retried. Actions (clicks, key presses) are dispatched
//! once; if they fail, the test fails.
//!
//! Time is measured with [`tokio::time::Instant`] and suspension uses
//! [`tokio::time::sleep`], so the driver transport is never blocked and tests
//! can run on a paused clock.

use crate::driver::{ElementHandle, LabDriver};
use crate::result::{LabError, LabResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Diagnostic used when the caller gives none
pub const DEFAULT_WAIT_MESSAGE: &str = "condition was not met";

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// What a wait does when its predicate returns an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Transient lookup errors ([`LabError::is_transient`]) count as "not yet
    /// true"; anything else fails the wait immediately
    #[default]
    RetryTransient,
    /// Every predicate error fails the wait immediately
    FailFast,
}

impl ErrorPolicy {
    /// Whether polling continues after `err`
    #[must_use]
    pub const fn keeps_polling(self, err: &LabError) -> bool {
        match self {
            Self::RetryTransient => err.is_transient(),
            Self::FailFast => false,
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Handling of predicate errors
    pub error_policy: ErrorPolicy,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set error policy
    #[must_use]
    pub const fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT STATE / RESULT
// =============================================================================

/// Lifecycle of a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitState {
    /// Predicate not yet true, budget not exhausted
    Polling,
    /// Predicate returned true
    Settled,
    /// Budget exhausted
    TimedOut,
}

impl WaitState {
    /// Settled and TimedOut are final
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Final state (always [`WaitState::Settled`] for a returned result)
    pub state: WaitState,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of predicate evaluations
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    fn settled(elapsed: Duration, polls: u32, waited_for: impl Into<String>) -> Self {
        Self {
            state: WaitState::Settled,
            elapsed,
            polls,
            waited_for: waited_for.into(),
        }
    }
}

/// Element-count condition for presence waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountCondition {
    /// At least n matches
    AtLeast(usize),
    /// Strictly fewer than n matches
    FewerThan(usize),
}

impl CountCondition {
    /// Check a match count against the condition
    #[must_use]
    pub const fn is_met(self, count: usize) -> bool {
        match self {
            Self::AtLeast(n) => count >= n,
            Self::FewerThan(n) => count < n,
        }
    }
}

impl fmt::Display for CountCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::FewerThan(n) => write!(f, "fewer than {n}"),
        }
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls predicates until they hold or their budget runs out
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Same waiter with a different budget
    #[must_use]
    pub const fn with_timeout(self, timeout_ms: u64) -> Self {
        Self {
            options: self.options.with_timeout(timeout_ms),
        }
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Wait for `predicate` with this waiter's options
    pub async fn wait_until<F, Fut>(
        &self,
        predicate: F,
        message: Option<&str>,
    ) -> LabResult<WaitResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LabResult<bool>>,
    {
        self.wait_until_with(predicate, &self.options, message).await
    }

    /// Wait for `predicate` with explicit options.
    ///
    /// Returns as soon as the predicate yields `true`. Fails with
    /// [`LabError::Timeout`] carrying `message` (or [`DEFAULT_WAIT_MESSAGE`])
    /// once the budget is spent. The last sleep is clamped to the deadline,
    /// so the final evaluation happens at the deadline and the timeout fires
    /// no later than one poll interval past it.
    pub async fn wait_until_with<F, Fut>(
        &self,
        mut predicate: F,
        options: &WaitOptions,
        message: Option<&str>,
    ) -> LabResult<WaitResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LabResult<bool>>,
    {
        let waited_for = message.unwrap_or(DEFAULT_WAIT_MESSAGE);
        let start = Instant::now();
        let deadline = start + options.timeout();
        let mut polls = 0u32;
        let mut last_error: Option<LabError> = None;

        loop {
            polls += 1;
            match predicate().await {
                Ok(true) => {
                    let elapsed = start.elapsed();
                    debug!(
                        waited_for,
                        polls,
                        elapsed_ms = elapsed.as_millis() as u64,
                        state = ?WaitState::Settled,
                        "wait settled"
                    );
                    return Ok(WaitResult::settled(elapsed, polls, waited_for));
                }
                Ok(false) => {}
                Err(err) if options.error_policy.keeps_polling(&err) => {
                    trace!(waited_for, error = %err, "transient error while polling");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    waited_for,
                    polls,
                    timeout_ms = options.timeout_ms,
                    state = ?WaitState::TimedOut,
                    "wait timed out"
                );
                let message = match last_error {
                    Some(err) => format!("{waited_for} (last error: {err})"),
                    None => waited_for.to_string(),
                };
                return Err(LabError::Timeout {
                    ms: options.timeout_ms,
                    message,
                });
            }

            sleep(options.poll_interval().min(deadline - now)).await;
        }
    }

    /// Fixed settle pause, for UI transitions with no observable end
    pub async fn pause(&self, ms: u64) {
        trace!(ms, "pause");
        sleep(Duration::from_millis(ms)).await;
    }

    // -------------------------------------------------------------------------
    // Presence waits
    // -------------------------------------------------------------------------

    /// Wait until the number of elements matching `selector` (inside `scope`
    /// when given) satisfies `condition`
    pub async fn count<D>(
        &self,
        driver: &D,
        scope: Option<&ElementHandle>,
        selector: &Selector,
        condition: CountCondition,
        message: Option<&str>,
    ) -> LabResult<WaitResult>
    where
        D: LabDriver + ?Sized,
    {
        let default_message;
        let message = match message {
            Some(message) => message,
            None => {
                default_message = format!("{condition} elements matching {selector}");
                default_message.as_str()
            }
        };

        self.wait_until(
            move || async move {
                let found = match scope {
                    Some(scope) => driver.count_in(scope, selector).await?,
                    None => driver.count(selector).await?,
                };
                Ok(condition.is_met(found))
            },
            Some(message),
        )
        .await
    }

    /// Wait until at least one element matches `selector`
    pub async fn present<D>(&self, driver: &D, selector: &Selector) -> LabResult<WaitResult>
    where
        D: LabDriver + ?Sized,
    {
        self.count(driver, None, selector, CountCondition::AtLeast(1), None)
            .await
    }

    /// Wait until at least one descendant of `scope` matches `selector`
    pub async fn present_in<D>(
        &self,
        driver: &D,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> LabResult<WaitResult>
    where
        D: LabDriver + ?Sized,
    {
        self.count(
            driver,
            Some(scope),
            selector,
            CountCondition::AtLeast(1),
            None,
        )
        .await
    }

    // -------------------------------------------------------------------------
    // Interactability waits
    // -------------------------------------------------------------------------

    /// Wait until an already-resolved element is visible and not disabled
    pub async fn enabled<D>(&self, driver: &D, element: &ElementHandle) -> LabResult<WaitResult>
    where
        D: LabDriver + ?Sized,
    {
        let message = format!("{element} to be enabled");
        self.wait_until(
            move || async move { is_interactable(driver, element).await },
            Some(message.as_str()),
        )
        .await
    }

    /// Resolve `selector` on every poll and wait until the match is visible
    /// and not disabled; returns the element that passed the check
    pub async fn selector_enabled<D>(
        &self,
        driver: &D,
        selector: &Selector,
    ) -> LabResult<ElementHandle>
    where
        D: LabDriver + ?Sized,
    {
        let message = format!("{selector} to be enabled");
        let matched = OnceLock::new();
        let slot = &matched;
        self.wait_until(
            move || async move {
                let element = driver.find_one(selector).await?;
                settle_on(slot, driver, element).await
            },
            Some(message.as_str()),
        )
        .await?;
        matched
            .into_inner()
            .ok_or_else(|| LabError::not_found(selector))
    }

    /// Like [`selector_enabled`](Self::selector_enabled) for the
    /// `index`-th match; the item may render after the wait starts
    pub async fn nth_enabled<D>(
        &self,
        driver: &D,
        selector: &Selector,
        index: usize,
    ) -> LabResult<ElementHandle>
    where
        D: LabDriver + ?Sized,
    {
        let message = format!("{selector} [{index}] to be enabled");
        let matched = OnceLock::new();
        let slot = &matched;
        self.wait_until(
            move || async move {
                let element = driver.find_nth(selector, index).await?;
                settle_on(slot, driver, element).await
            },
            Some(message.as_str()),
        )
        .await?;
        matched
            .into_inner()
            .ok_or_else(|| LabError::not_found(format!("{selector} [{index}]")))
    }

    /// Wait until `selector` resolves to a visible element
    pub async fn displayed<D>(
        &self,
        driver: &D,
        selector: &Selector,
        message: Option<&str>,
    ) -> LabResult<WaitResult>
    where
        D: LabDriver + ?Sized,
    {
        let default_message = format!("{selector} to be displayed");
        self.wait_until(
            move || async move {
                let element = driver.find_one(selector).await?;
                driver.is_displayed(&element).await
            },
            Some(message.unwrap_or(&default_message)),
        )
        .await
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// [`Waiter::count`] with one-off options
pub async fn wait_for_count<D>(
    driver: &D,
    selector: &Selector,
    scope: Option<&ElementHandle>,
    condition: CountCondition,
    options: &WaitOptions,
) -> LabResult<WaitResult>
where
    D: LabDriver + ?Sized,
{
    Waiter::with_options(*options)
        .count(driver, scope, selector, condition, None)
        .await
}

/// [`Waiter::present`] with one-off options
pub async fn wait_for_present<D>(
    driver: &D,
    selector: &Selector,
    options: &WaitOptions,
) -> LabResult<WaitResult>
where
    D: LabDriver + ?Sized,
{
    wait_for_count(driver, selector, None, CountCondition::AtLeast(1), options).await
}

/// [`Waiter::enabled`] with one-off options
pub async fn wait_for_enabled<D>(
    driver: &D,
    element: &ElementHandle,
    options: &WaitOptions,
) -> LabResult<WaitResult>
where
    D: LabDriver + ?Sized,
{
    Waiter::with_options(*options).enabled(driver, element).await
}

/// [`Waiter::selector_enabled`] with one-off options
pub async fn wait_for_selector_enabled<D>(
    driver: &D,
    selector: &Selector,
    options: &WaitOptions,
) -> LabResult<ElementHandle>
where
    D: LabDriver + ?Sized,
{
    Waiter::with_options(*options)
        .selector_enabled(driver, selector)
        .await
}

/// [`Waiter::displayed`] with one-off options
pub async fn wait_for_displayed<D>(
    driver: &D,
    selector: &Selector,
    options: &WaitOptions,
    message: Option<&str>,
) -> LabResult<WaitResult>
where
    D: LabDriver + ?Sized,
{
    Waiter::with_options(*options)
        .displayed(driver, selector, message)
        .await
}

/// Keep `element` in `slot` once it is interactable
async fn settle_on<D>(
    slot: &OnceLock<ElementHandle>,
    driver: &D,
    element: ElementHandle,
) -> LabResult<bool>
where
    D: LabDriver + ?Sized,
{
    let ready = is_interactable(driver, &element).await?;
    if ready {
        let _ = slot.set(element);
    }
    Ok(ready)
}

async fn is_interactable<D>(driver: &D, element: &ElementHandle) -> LabResult<bool>
where
    D: LabDriver + ?Sized,
{
    Ok(driver.is_displayed(element).await? && driver.is_enabled(element).await?)
}

// =============================================================================
// TESTS
// =============================================================================

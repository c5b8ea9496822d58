//! Page Object Model support
//!
//! A page object encapsulates the structure and behaviour of one page of
//! the application under test. Tests call its helpers instead of spelling
//! out selectors, so a UI change is fixed in one place.
//!
//! [`LabPage`](crate::lab::LabPage) is the page object for JupyterLab.

use crate::driver::LabDriver;
use crate::lab::selectors::FILE_BROWSER_CRUMBS;
use crate::lab::LabPage;
use crate::result::LabResult;
use crate::selector::Selector;
use crate::wait::{WaitResult, Waiter};
use async_trait::async_trait;

/// Trait for page objects representing a page or component in the UI.
///
/// # Example
///
/// ```ignore
/// struct TreePage<D> {
///     driver: D,
/// }
///
/// #[async_trait]
/// impl<D: LabDriver> PageObject for TreePage<D> {
///     fn url_pattern(&self) -> &str {
///         "/tree"
///     }
///
///     async fn is_loaded(&self) -> LabResult<bool> {
///         let rows = self.driver.find_all(&Selector::css("div.list_item")).await?;
///         Ok(!rows.is_empty())
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// URL path that serves this page (e.g., "/lab")
    fn url_pattern(&self) -> &str;

    /// Whether the page is ready for interaction
    async fn is_loaded(&self) -> LabResult<bool>;

    /// Budget for the page to load (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        30_000
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Poll [`is_loaded`](Self::is_loaded) until it holds, within
    /// [`load_timeout_ms`](Self::load_timeout_ms)
    async fn wait_until_loaded(&self, waiter: &Waiter) -> LabResult<WaitResult> {
        let message = format!("{} to load", self.page_name());
        waiter
            .with_timeout(self.load_timeout_ms())
            .wait_until(|| self.is_loaded(), Some(message.as_str()))
            .await
    }
}

#[async_trait]
impl<D: LabDriver> PageObject for LabPage<D> {
    fn url_pattern(&self) -> &str {
        "/lab"
    }

    async fn is_loaded(&self) -> LabResult<bool> {
        let crumbs = self
            .driver()
            .find_all(&Selector::parse(FILE_BROWSER_CRUMBS))
            .await?;
        Ok(!crumbs.is_empty())
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config().long_wait_timeout_ms
    }

    fn page_name(&self) -> &str {
        "JupyterLab"
    }
}

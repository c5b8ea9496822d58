//! LabDriver - abstract browser automation capability
//!
//! Page objects never talk to a browser directly; they go through this trait
//! so the same helpers run against Chromium (`browser` feature) or the
//! in-memory [`ScriptedDriver`](crate::mock::ScriptedDriver) used in unit
//! tests.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  LabPage (page object)  ──►  Waiter (poll until settled)     │
//! │            │                          │                      │
//! │            ▼                          ▼                      │
//! │  LabDriver (trait): find / click / keys / window / switch    │
//! ├───────────────────────────────┬──────────────────────────────┤
//! │  ChromiumDriver (CDP)         │  ScriptedDriver (in-memory)  │
//! └───────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! All methods take `&self`. A driver serves one command at a time, and
//! wait predicates need shared access to the driver while the page object
//! holds it.

use crate::result::{LabError, LabResult};
use crate::selector::Selector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a located DOM node.
///
/// A handle is resolved by the driver that produced it. If the DOM mutates
/// the node may disappear, after which any use reports
/// [`LabError::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific node id
    pub id: String,
    /// Selector the node was found with (for diagnostics)
    pub selector: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, selector: impl fmt::Display) -> Self {
        Self {
            id: id.into(),
            selector: selector.to_string(),
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.selector, self.id)
    }
}

/// Browser window dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl WindowSize {
    /// Create a new window size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Same height, width grown by `add`
    #[must_use]
    pub const fn wider_by(self, add: u32) -> Self {
        Self {
            width: self.width.saturating_add(add),
            height: self.height,
        }
    }
}

/// A key or text chunk sent to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Literal text, typed character by character
    Text(String),
    /// Tab
    Tab,
    /// Shift (held until [`Key::Null`])
    Shift,
    /// Enter
    Enter,
    /// Escape
    Escape,
    /// Releases every held modifier (WebDriver `\u{E000}`)
    Null,
}

impl Key {
    /// Create a text key sequence
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// DOM `KeyboardEvent.key` value for named keys
    #[must_use]
    pub const fn key_name(&self) -> Option<&'static str> {
        match self {
            Self::Text(_) | Self::Null => None,
            Self::Tab => Some("Tab"),
            Self::Shift => Some("Shift"),
            Self::Enter => Some("Enter"),
            Self::Escape => Some("Escape"),
        }
    }

    /// Whether the key stays pressed until released
    #[must_use]
    pub const fn is_modifier(&self) -> bool {
        matches!(self, Self::Shift)
    }
}

/// Browser automation capability consumed by page objects
#[async_trait]
pub trait LabDriver: Send + Sync {
    /// Navigate the current window to URL
    async fn navigate(&self, url: &str) -> LabResult<()>;

    /// Query all matching elements in the document (may be empty)
    async fn find_all(&self, selector: &Selector) -> LabResult<Vec<ElementHandle>>;

    /// Query all matching descendants of `scope`
    async fn find_all_in(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> LabResult<Vec<ElementHandle>>;

    /// Click element
    async fn click(&self, element: &ElementHandle) -> LabResult<()>;

    /// Double-click element
    async fn double_click(&self, element: &ElementHandle) -> LabResult<()>;

    /// Scroll element into the viewport
    async fn scroll_into_view(&self, element: &ElementHandle) -> LabResult<()>;

    /// Focus element and send keys to it
    async fn send_keys_to(&self, element: &ElementHandle, keys: &[Key]) -> LabResult<()>;

    /// Send keys to whatever element currently has focus
    async fn send_keys(&self, keys: &[Key]) -> LabResult<()>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, element: &ElementHandle) -> LabResult<bool>;

    /// Whether the element is not disabled
    async fn is_enabled(&self, element: &ElementHandle) -> LabResult<bool>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementHandle) -> LabResult<String>;

    /// Current window size
    async fn window_size(&self) -> LabResult<WindowSize>;

    /// Resize the current window
    async fn set_window_size(&self, size: WindowSize) -> LabResult<()>;

    /// Make the window with this title current
    async fn switch_to_window(&self, title: &str) -> LabResult<()>;

    /// First matching element, or [`LabError::NotFound`]
    async fn find_one(&self, selector: &Selector) -> LabResult<ElementHandle> {
        self.find_all(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LabError::not_found(selector))
    }

    /// First matching descendant of `scope`, or [`LabError::NotFound`]
    async fn find_one_in(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> LabResult<ElementHandle> {
        self.find_all_in(scope, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LabError::not_found(selector))
    }

    /// Number of matching elements in the document.
    ///
    /// Waits poll through this; drivers that keep a handle table should
    /// count without registering handles.
    async fn count(&self, selector: &Selector) -> LabResult<usize> {
        Ok(self.find_all(selector).await?.len())
    }

    /// Number of matching descendants of `scope`
    async fn count_in(&self, scope: &ElementHandle, selector: &Selector) -> LabResult<usize> {
        Ok(self.find_all_in(scope, selector).await?.len())
    }

    /// The `index`-th matching element (zero-based)
    async fn find_nth(&self, selector: &Selector, index: usize) -> LabResult<ElementHandle> {
        self.find_all(selector)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| LabError::not_found(format!("{selector} [{index}]")))
    }
}

//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`ChromiumDriver`] launches Chromium through
//! chromiumoxide and implements [`LabDriver`](crate::LabDriver) on top of it.
//! [`BrowserConfig`] is always available so configuration can be parsed and
//! validated without a browser.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Initial window width
    pub window_width: u32,
    /// Initial window height
    pub window_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set initial window dimensions
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// CDP driver (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{ElementHandle, Key, LabDriver, WindowSize};
    use crate::result::{LabError, LabResult};
    use crate::selector::Selector;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::{
        Bounds, GetWindowForTargetParams, SetWindowBoundsParams,
    };
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, InsertTextParams, MouseButton,
    };
    use chromiumoxide::cdp::js_protocol::runtime::ReleaseObjectParams;
    use chromiumoxide::element::Element;
    use chromiumoxide::error::CdpError;
    use chromiumoxide::page::Page;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::collections::HashMap;
    use tokio::sync::Mutex;
    use tracing::debug;

    const SHIFT_MODIFIER: i64 = 8;

    const IS_DISPLAYED_JS: &str = "function() {
        if (!this.isConnected) { return null; }
        const style = window.getComputedStyle(this);
        const rect = this.getBoundingClientRect();
        return style.visibility !== 'hidden' && style.display !== 'none'
            && rect.width > 0 && rect.height > 0;
    }";

    const IS_ENABLED_JS: &str = "function() {
        if (!this.isConnected) { return null; }
        return !this.disabled && !this.classList.contains('p-mod-disabled');
    }";

    const FOCUS_UNLESS_CONTAINS_JS: &str = "function() {
        if (!this.isConnected) { return null; }
        if (!this.contains(document.activeElement)) { this.focus(); }
        return true;
    }";

    fn cdp_error(err: CdpError) -> LabError {
        LabError::driver(err.to_string())
    }

    /// Expression counting document matches without resolving nodes
    fn count_script(selector: &Selector) -> LabResult<String> {
        if let Some(css) = selector.as_css() {
            let css = serde_json::to_string(css)?;
            return Ok(format!("document.querySelectorAll({css}).length"));
        }
        let xpath = selector
            .to_xpath()
            .ok_or_else(|| LabError::UnsupportedSelector {
                selector: selector.to_string(),
            })?;
        let xpath = serde_json::to_string(&xpath)?;
        Ok(format!(
            "document.evaluate({xpath}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
        ))
    }

    /// Function counting descendants of `this`; null once detached
    fn count_in_function(css: &str) -> LabResult<String> {
        let css = serde_json::to_string(css)?;
        Ok(format!(
            "function() {{
                if (!this.isConnected) {{ return null; }}
                return this.querySelectorAll({css}).length;
            }}"
        ))
    }

    /// Named key as sent through `Input.dispatchKeyEvent`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct KeyDef {
        key: &'static str,
        code: &'static str,
        key_code: i64,
        text: Option<&'static str>,
    }

    fn key_def(key: &Key) -> Option<KeyDef> {
        let def = match key {
            Key::Text(_) | Key::Null => return None,
            Key::Tab => KeyDef {
                key: "Tab",
                code: "Tab",
                key_code: 9,
                text: None,
            },
            Key::Shift => KeyDef {
                key: "Shift",
                code: "ShiftLeft",
                key_code: 16,
                text: None,
            },
            Key::Enter => KeyDef {
                key: "Enter",
                code: "Enter",
                key_code: 13,
                text: Some("\r"),
            },
            Key::Escape => KeyDef {
                key: "Escape",
                code: "Escape",
                key_code: 27,
                text: None,
            },
        };
        Some(def)
    }

    /// Resolved elements by handle id, at most one handle per DOM node.
    ///
    /// Nodes are keyed by backend node id, so finding the same node again
    /// hands back its existing handle.
    #[derive(Debug)]
    struct HandleTable<T> {
        entries: HashMap<String, (i64, T)>,
        by_node: HashMap<i64, String>,
    }

    impl<T> Default for HandleTable<T> {
        fn default() -> Self {
            Self {
                entries: HashMap::new(),
                by_node: HashMap::new(),
            }
        }
    }

    impl<T> HandleTable<T> {
        /// Handle id for `node`. When the node already has a handle the
        /// new `value` is handed back so its remote object can be released.
        fn insert(&mut self, node: i64, value: T) -> (String, Option<T>) {
            if let Some(id) = self.by_node.get(&node) {
                return (id.clone(), Some(value));
            }
            let id = uuid::Uuid::new_v4().to_string();
            self.by_node.insert(node, id.clone());
            self.entries.insert(id.clone(), (node, value));
            (id, None)
        }

        fn get(&self, id: &str) -> Option<&T> {
            self.entries.get(id).map(|(_, value)| value)
        }

        /// Drop a handle found stale
        fn forget(&mut self, id: &str) -> Option<T> {
            let (node, value) = self.entries.remove(id)?;
            self.by_node.remove(&node);
            Some(value)
        }

        fn clear(&mut self) {
            self.entries.clear();
            self.by_node.clear();
        }

        #[cfg(test)]
        fn len(&self) -> usize {
            self.entries.len()
        }
    }

    #[derive(Debug, Default)]
    struct Session {
        elements: HandleTable<Element>,
        modifiers: i64,
    }

    /// [`LabDriver`] backed by a Chromium instance
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<Browser>,
        page: Mutex<Page>,
        session: Mutex<Session>,
        handler: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        pub async fn launch(config: &BrowserConfig) -> LabResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.window_width, config.window_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder
                .build()
                .map_err(|message| LabError::BrowserLaunchError { message })?;

            let (browser, mut handler) = Browser::launch(cdp_config)
                .await
                .map_err(|e| LabError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| LabError::BrowserLaunchError {
                    message: e.to_string(),
                })?;
            debug!(headless = config.headless, "browser launched");

            Ok(Self {
                browser: Mutex::new(browser),
                page: Mutex::new(page),
                session: Mutex::new(Session::default()),
                handler,
            })
        }

        /// Close the browser
        pub async fn close(mut self) -> LabResult<()> {
            self.browser.get_mut().close().await.map_err(cdp_error)?;
            self.handler.abort();
            Ok(())
        }

        async fn current_page(&self) -> Page {
            self.page.lock().await.clone()
        }

        async fn register(&self, found: Vec<Element>, selector: &Selector) -> Vec<ElementHandle> {
            let mut duplicates = Vec::new();
            let handles = {
                let mut session = self.session.lock().await;
                found
                    .into_iter()
                    .map(|element| {
                        let node = *element.backend_node_id.inner();
                        let (id, duplicate) = session.elements.insert(node, element);
                        duplicates.extend(duplicate);
                        ElementHandle::new(id, selector)
                    })
                    .collect()
            };
            self.release(duplicates).await;
            handles
        }

        /// Release remote objects no handle refers to
        async fn release(&self, elements: impl IntoIterator<Item = Element>) {
            let page = self.current_page().await;
            for element in elements {
                let params = ReleaseObjectParams::new(element.remote_object_id.clone());
                if let Err(e) = page.execute(params).await {
                    debug!(error = %e, "release remote object");
                }
            }
        }

        async fn call_fn<T: DeserializeOwned>(
            &self,
            element: &ElementHandle,
            function: &str,
        ) -> LabResult<T> {
            let gone = {
                let mut session = self.session.lock().await;
                let target = session
                    .elements
                    .get(&element.id)
                    .ok_or_else(|| stale(element))?;
                let returns = target
                    .call_js_fn(function, false)
                    .await
                    .map_err(cdp_error)?;
                // Detached nodes make the helpers return null.
                match returns.result.value.filter(|v| !v.is_null()) {
                    Some(value) => return Ok(serde_json::from_value(value)?),
                    None => session.elements.forget(&element.id),
                }
            };
            debug!(%element, "dropping stale handle");
            self.release(gone).await;
            Err(stale(element))
        }

        async fn dispatch_key(&self, page: &Page, def: KeyDef, modifiers: i64) -> LabResult<()> {
            for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
                let mut event = DispatchKeyEventParams::builder()
                    .r#type(kind.clone())
                    .key(def.key)
                    .code(def.code)
                    .windows_virtual_key_code(def.key_code)
                    .modifiers(modifiers);
                if let (Some(text), DispatchKeyEventType::KeyDown) = (def.text, &kind) {
                    event = event.text(text);
                }
                let event = event.build().map_err(LabError::driver)?;
                page.execute(event).await.map_err(cdp_error)?;
            }
            Ok(())
        }

        async fn press_modifier(&self, page: &Page, def: KeyDef, down: bool) -> LabResult<()> {
            let kind = if down {
                DispatchKeyEventType::KeyDown
            } else {
                DispatchKeyEventType::KeyUp
            };
            let event = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(def.key)
                .code(def.code)
                .windows_virtual_key_code(def.key_code)
                .modifiers(if down { SHIFT_MODIFIER } else { 0 })
                .build()
                .map_err(LabError::driver)?;
            page.execute(event).await.map_err(cdp_error)?;
            Ok(())
        }

        async fn type_keys(&self, keys: &[Key]) -> LabResult<()> {
            let page = self.current_page().await;
            let mut session = self.session.lock().await;
            for key in keys {
                match key {
                    Key::Text(text) => {
                        page.execute(InsertTextParams::new(text.clone()))
                            .await
                            .map_err(cdp_error)?;
                    }
                    Key::Null => {
                        if session.modifiers != 0 {
                            if let Some(shift) = key_def(&Key::Shift) {
                                self.press_modifier(&page, shift, false).await?;
                            }
                            session.modifiers = 0;
                        }
                    }
                    named => {
                        let Some(def) = key_def(named) else { continue };
                        if named.is_modifier() {
                            self.press_modifier(&page, def, true).await?;
                            session.modifiers |= SHIFT_MODIFIER;
                        } else {
                            self.dispatch_key(&page, def, session.modifiers).await?;
                        }
                    }
                }
            }
            Ok(())
        }

        async fn mouse(
            &self,
            kind: DispatchMouseEventType,
            x: f64,
            y: f64,
            count: i64,
        ) -> LabResult<()> {
            let event = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(x)
                .y(y)
                .button(MouseButton::Left)
                .click_count(count)
                .build()
                .map_err(LabError::driver)?;
            self.current_page()
                .await
                .execute(event)
                .await
                .map_err(cdp_error)?;
            Ok(())
        }
    }

    fn stale(element: &ElementHandle) -> LabError {
        LabError::StaleElement {
            id: element.id.clone(),
        }
    }

    #[async_trait]
    impl LabDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> LabResult<()> {
            debug!(url, "navigate");
            let page = self.current_page().await;
            page.goto(url)
                .await
                .map_err(|e| LabError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.session.lock().await.elements.clear();
            Ok(())
        }

        async fn count(&self, selector: &Selector) -> LabResult<usize> {
            let script = count_script(selector)?;
            let page = self.current_page().await;
            let count = page.evaluate(script).await.map_err(cdp_error)?;
            Ok(count.into_value()?)
        }

        async fn count_in(&self, scope: &ElementHandle, selector: &Selector) -> LabResult<usize> {
            let css = selector
                .as_css()
                .ok_or_else(|| LabError::UnsupportedSelector {
                    selector: selector.to_string(),
                })?;
            self.call_fn(scope, &count_in_function(css)?).await
        }

        async fn find_all(&self, selector: &Selector) -> LabResult<Vec<ElementHandle>> {
            let page = self.current_page().await;
            let found = match selector.as_css() {
                Some(css) => page.find_elements(css).await,
                None => {
                    let xpath = selector
                        .to_xpath()
                        .ok_or_else(|| LabError::UnsupportedSelector {
                            selector: selector.to_string(),
                        })?;
                    page.find_xpaths(xpath).await
                }
            }
            .map_err(cdp_error)?;
            Ok(self.register(found, selector).await)
        }

        async fn find_all_in(
            &self,
            scope: &ElementHandle,
            selector: &Selector,
        ) -> LabResult<Vec<ElementHandle>> {
            let css = selector
                .as_css()
                .ok_or_else(|| LabError::UnsupportedSelector {
                    selector: selector.to_string(),
                })?;
            let found = {
                let session = self.session.lock().await;
                let parent = session.elements.get(&scope.id).ok_or_else(|| stale(scope))?;
                parent.find_elements(css).await.map_err(cdp_error)?
            };
            Ok(self.register(found, selector).await)
        }

        async fn click(&self, element: &ElementHandle) -> LabResult<()> {
            debug!(%element, "click");
            let session = self.session.lock().await;
            let target = session.elements.get(&element.id).ok_or_else(|| stale(element))?;
            target.click().await.map_err(cdp_error)?;
            Ok(())
        }

        async fn double_click(&self, element: &ElementHandle) -> LabResult<()> {
            debug!(%element, "double click");
            let point = {
                let session = self.session.lock().await;
                let target = session.elements.get(&element.id).ok_or_else(|| stale(element))?;
                target.scroll_into_view().await.map_err(cdp_error)?;
                target.clickable_point().await.map_err(cdp_error)?
            };
            for count in 1..=2 {
                self.mouse(DispatchMouseEventType::MousePressed, point.x, point.y, count)
                    .await?;
                self.mouse(DispatchMouseEventType::MouseReleased, point.x, point.y, count)
                    .await?;
            }
            Ok(())
        }

        async fn scroll_into_view(&self, element: &ElementHandle) -> LabResult<()> {
            let session = self.session.lock().await;
            let target = session.elements.get(&element.id).ok_or_else(|| stale(element))?;
            target.scroll_into_view().await.map_err(cdp_error)?;
            Ok(())
        }

        async fn send_keys_to(&self, element: &ElementHandle, keys: &[Key]) -> LabResult<()> {
            debug!(%element, count = keys.len(), "send keys to element");
            self.call_fn::<bool>(element, FOCUS_UNLESS_CONTAINS_JS).await?;
            self.type_keys(keys).await
        }

        async fn send_keys(&self, keys: &[Key]) -> LabResult<()> {
            debug!(count = keys.len(), "send keys");
            self.type_keys(keys).await
        }

        async fn is_displayed(&self, element: &ElementHandle) -> LabResult<bool> {
            self.call_fn(element, IS_DISPLAYED_JS).await
        }

        async fn is_enabled(&self, element: &ElementHandle) -> LabResult<bool> {
            self.call_fn(element, IS_ENABLED_JS).await
        }

        async fn text(&self, element: &ElementHandle) -> LabResult<String> {
            let session = self.session.lock().await;
            let target = session.elements.get(&element.id).ok_or_else(|| stale(element))?;
            let text = target.inner_text().await.map_err(cdp_error)?;
            Ok(text.unwrap_or_default())
        }

        async fn window_size(&self) -> LabResult<WindowSize> {
            let page = self.current_page().await;
            let window = page
                .execute(GetWindowForTargetParams::default())
                .await
                .map_err(cdp_error)?;
            let width = window.bounds.width.unwrap_or_default();
            let height = window.bounds.height.unwrap_or_default();
            Ok(WindowSize::new(
                u32::try_from(width).unwrap_or_default(),
                u32::try_from(height).unwrap_or_default(),
            ))
        }

        async fn set_window_size(&self, size: WindowSize) -> LabResult<()> {
            debug!(width = size.width, height = size.height, "resize window");
            let page = self.current_page().await;
            let window = page
                .execute(GetWindowForTargetParams::default())
                .await
                .map_err(cdp_error)?;
            let bounds = Bounds::builder()
                .width(i64::from(size.width))
                .height(i64::from(size.height))
                .build();
            page.execute(SetWindowBoundsParams::new(window.window_id.clone(), bounds))
                .await
                .map_err(cdp_error)?;
            Ok(())
        }

        async fn switch_to_window(&self, title: &str) -> LabResult<()> {
            debug!(title, "switch window");
            let pages = self.browser.lock().await.pages().await.map_err(cdp_error)?;
            for page in pages {
                let current = page.get_title().await.map_err(cdp_error)?;
                if current.as_deref() == Some(title) {
                    page.bring_to_front().await.map_err(cdp_error)?;
                    *self.page.lock().await = page;
                    return Ok(());
                }
            }
            Err(LabError::not_found(format!("window titled {title:?}")))
        }
    }

}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

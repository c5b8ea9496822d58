//! In-memory DOM driver with time-scripted behaviour.

use crate::driver::{ElementHandle, Key, LabDriver, WindowSize};
use crate::result::{LabError, LabResult};
use crate::selector::Selector;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Description of a scripted DOM node
#[derive(Debug, Clone)]
pub struct Node {
    selector: Selector,
    parent: Option<String>,
    text: String,
    attached_at: Option<Duration>,
    enabled_at: Duration,
    removed_at: Option<Duration>,
    hidden: bool,
}

impl Node {
    /// A node found by `selector`, attached and enabled from the start
    #[must_use]
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            parent: None,
            text: String::new(),
            attached_at: Some(Duration::ZERO),
            enabled_at: Duration::ZERO,
            removed_at: None,
            hidden: false,
        }
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Nest under another node (for scoped queries)
    #[must_use]
    pub fn child_of(mut self, parent: &ElementHandle) -> Self {
        self.parent = Some(parent.id.clone());
        self
    }

    /// Attach the node `ms` after the driver was created
    #[must_use]
    pub fn appear_after(mut self, ms: u64) -> Self {
        self.attached_at = Some(Duration::from_millis(ms));
        self
    }

    /// Keep the node out of the DOM until a click reveals it
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.attached_at = None;
        self
    }

    /// Report the node disabled until `ms` after the driver was created
    #[must_use]
    pub fn enabled_after(mut self, ms: u64) -> Self {
        self.enabled_at = Duration::from_millis(ms);
        self
    }

    /// Remove the node `ms` after the driver was created
    #[must_use]
    pub fn removed_after(mut self, ms: u64) -> Self {
        self.removed_at = Some(Duration::from_millis(ms));
        self
    }

    /// Present in the DOM but not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn is_attached(&self, now: Duration) -> bool {
        self.attached_at.is_some_and(|at| now >= at) && self.removed_at.map_or(true, |at| now < at)
    }
}

/// Scripted effect of clicking a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Detach the node with this handle
    Remove(ElementHandle),
    /// Detach the node with this handle `ms` after the click
    RemoveAfter(ElementHandle, u64),
    /// Attach the node with this handle
    Reveal(ElementHandle),
    /// Attach the node with this handle `ms` after the click
    RevealAfter(ElementHandle, u64),
}

#[derive(Debug)]
struct Entry {
    id: String,
    node: Node,
    on_click: Vec<Reaction>,
}

#[derive(Debug)]
struct DomState {
    entries: Vec<Entry>,
    next_id: u64,
    url: Option<String>,
    window: WindowSize,
    windows: Vec<String>,
    current_window: Option<String>,
    keys: Vec<(Option<String>, Vec<Key>)>,
    call_history: Vec<String>,
}

/// Driver over an in-memory DOM for unit tests.
///
/// Nodes are matched by selector equality: a node is found by exactly the
/// selector it was registered with. Timing uses [`tokio::time::Instant`],
/// measured from driver creation, so tests on a paused clock are exact.
#[derive(Debug)]
pub struct ScriptedDriver {
    epoch: Instant,
    state: Mutex<DomState>,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    /// Create an empty DOM with a 1280x800 window
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            state: Mutex::new(DomState {
                entries: Vec::new(),
                next_id: 0,
                url: None,
                window: WindowSize::new(1280, 800),
                windows: Vec::new(),
                current_window: None,
                keys: Vec::new(),
                call_history: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DomState> {
        // A panic while holding the lock only happens inside a failing test.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Register a node and return its handle
    pub fn add(&self, node: Node) -> ElementHandle {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("node-{}", state.next_id);
        let handle = ElementHandle::new(id.clone(), &node.selector);
        state.entries.push(Entry {
            id,
            node,
            on_click: Vec::new(),
        });
        handle
    }

    /// Script an effect for clicks on `element`
    pub fn on_click(&self, element: &ElementHandle, reaction: Reaction) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.id == element.id) {
            entry.on_click.push(reaction);
        }
    }

    /// Register a browser window title
    pub fn add_window(&self, title: impl Into<String>) {
        self.lock().windows.push(title.into());
    }

    /// Set the current window size
    pub fn set_initial_window(&self, size: WindowSize) {
        self.lock().window = size;
    }

    /// Last navigated URL
    #[must_use]
    pub fn current_url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    /// Title of the window switched to last
    #[must_use]
    pub fn current_window(&self) -> Option<String> {
        self.lock().current_window.clone()
    }

    /// Keys sent so far, with the target element id (`None` = focused element)
    #[must_use]
    pub fn keys_sent(&self) -> Vec<(Option<String>, Vec<Key>)> {
        self.lock().keys.clone()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Action calls only (clicks, keys, window and navigation changes)
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.lock()
            .call_history
            .iter()
            .filter(|c| !["find", "query", "count"].iter().any(|q| c.starts_with(q)))
            .cloned()
            .collect()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, call: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(call))
    }

    /// Number of calls starting with `call`
    #[must_use]
    pub fn count_calls(&self, call: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(call))
            .count()
    }

    /// Resolve a handle to its live entry, recording the call
    fn with_live<T>(
        &self,
        element: &ElementHandle,
        call: &str,
        f: impl FnOnce(&mut DomState, usize, Duration) -> T,
    ) -> LabResult<T> {
        let now = self.now();
        let mut state = self.lock();
        state
            .call_history
            .push(format!("{call} {}", element.selector));
        let index = state
            .entries
            .iter()
            .position(|e| e.id == element.id && e.node.is_attached(now))
            .ok_or_else(|| LabError::StaleElement {
                id: element.id.clone(),
            })?;
        Ok(f(&mut *state, index, now))
    }

    fn query(&self, scope: Option<&ElementHandle>, selector: &Selector) -> Vec<ElementHandle> {
        let call = match scope {
            Some(scope) => format!("find_all_in {} {selector}", scope.id),
            None => format!("find_all {selector}"),
        };
        self.query_as(call, scope, selector)
    }

    fn query_as(
        &self,
        call: String,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> Vec<ElementHandle> {
        let now = self.now();
        let mut state = self.lock();
        state.call_history.push(call);

        let found = state
            .entries
            .iter()
            .filter(|e| e.node.is_attached(now) && &e.node.selector == selector)
            .filter(|e| scope.map_or(true, |s| is_descendant(&state.entries, &e.id, &s.id)))
            .map(|e| ElementHandle::new(e.id.clone(), selector))
            .collect();
        found
    }
}

fn is_descendant(entries: &[Entry], id: &str, ancestor: &str) -> bool {
    let mut current = entries.iter().find(|e| e.id == id);
    while let Some(entry) = current {
        match entry.node.parent.as_deref() {
            Some(parent) if parent == ancestor => return true,
            Some(parent) => current = entries.iter().find(|e| e.id == parent),
            None => return false,
        }
    }
    false
}

fn reveal(entries: &mut [Entry], target: &ElementHandle, at: Duration) {
    if let Some(e) = entries.iter_mut().find(|e| e.id == target.id) {
        e.node.attached_at = Some(at);
        e.node.removed_at = None;
    }
}

fn describe_keys(keys: &[Key]) -> String {
    keys.iter()
        .map(|k| match k {
            Key::Text(t) => t.clone(),
            Key::Null => "<null>".to_string(),
            named => format!("<{}>", named.key_name().unwrap_or_default()),
        })
        .collect()
}

#[async_trait]
impl LabDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> LabResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("navigate {url}"));
        state.url = Some(url.to_string());
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> LabResult<Vec<ElementHandle>> {
        Ok(self.query(None, selector))
    }

    async fn find_all_in(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> LabResult<Vec<ElementHandle>> {
        self.with_live(scope, "query_scope", |_, _, _| ())?;
        Ok(self.query(Some(scope), selector))
    }

    async fn count(&self, selector: &Selector) -> LabResult<usize> {
        Ok(self.query_as(format!("count {selector}"), None, selector).len())
    }

    async fn count_in(&self, scope: &ElementHandle, selector: &Selector) -> LabResult<usize> {
        self.with_live(scope, "query_scope", |_, _, _| ())?;
        let call = format!("count_in {} {selector}", scope.id);
        Ok(self.query_as(call, Some(scope), selector).len())
    }

    async fn click(&self, element: &ElementHandle) -> LabResult<()> {
        self.with_live(element, "click", |state, index, now| {
            let reactions = state.entries[index].on_click.clone();
            for reaction in reactions {
                let (target, at) = match reaction {
                    Reaction::Remove(target) => (target, None),
                    Reaction::RemoveAfter(target, ms) => {
                        (target, Some(now + Duration::from_millis(ms)))
                    }
                    Reaction::Reveal(target) => {
                        reveal(&mut state.entries, &target, now);
                        continue;
                    }
                    Reaction::RevealAfter(target, ms) => {
                        reveal(&mut state.entries, &target, now + Duration::from_millis(ms));
                        continue;
                    }
                };
                if let Some(e) = state.entries.iter_mut().find(|e| e.id == target.id) {
                    e.node.removed_at = Some(at.unwrap_or(now));
                }
            }
        })
    }

    async fn double_click(&self, element: &ElementHandle) -> LabResult<()> {
        self.with_live(element, "double_click", |_, _, _| ())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> LabResult<()> {
        self.with_live(element, "scroll_into_view", |_, _, _| ())
    }

    async fn send_keys_to(&self, element: &ElementHandle, keys: &[Key]) -> LabResult<()> {
        let call = format!("send_keys_to [{}]", describe_keys(keys));
        self.with_live(element, &call, |state, index, _| {
            let id = state.entries[index].id.clone();
            state.keys.push((Some(id), keys.to_vec()));
        })
    }

    async fn send_keys(&self, keys: &[Key]) -> LabResult<()> {
        let mut state = self.lock();
        state
            .call_history
            .push(format!("send_keys [{}]", describe_keys(keys)));
        state.keys.push((None, keys.to_vec()));
        Ok(())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> LabResult<bool> {
        self.with_live(element, "query_displayed", |state, index, _| {
            !state.entries[index].node.hidden
        })
    }

    async fn is_enabled(&self, element: &ElementHandle) -> LabResult<bool> {
        self.with_live(element, "query_enabled", |state, index, now| {
            now >= state.entries[index].node.enabled_at
        })
    }

    async fn text(&self, element: &ElementHandle) -> LabResult<String> {
        self.with_live(element, "query_text", |state, index, _| {
            state.entries[index].node.text.clone()
        })
    }

    async fn window_size(&self) -> LabResult<WindowSize> {
        Ok(self.lock().window)
    }

    async fn set_window_size(&self, size: WindowSize) -> LabResult<()> {
        let mut state = self.lock();
        state
            .call_history
            .push(format!("set_window_size {}x{}", size.width, size.height));
        state.window = size;
        Ok(())
    }

    async fn switch_to_window(&self, title: &str) -> LabResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("switch_to_window {title}"));
        if !state.windows.iter().any(|w| w == title) {
            return Err(LabError::not_found(format!("window titled {title:?}")));
        }
        state.current_window = Some(title.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::{CountCondition, WaitOptions, Waiter};

    fn waiter() -> Waiter {
        Waiter::with_options(WaitOptions::new().with_timeout(5_000).with_poll_interval(50))
    }

    mod dom_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_find_by_registered_selector() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("div=File").with_text("File"));
            driver.add(Node::new("div=Edit"));

            let found = driver.find_all(&Selector::parse("div=File")).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(driver.text(&found[0]).await.unwrap(), "File");
            assert!(driver
                .find_all(&Selector::parse("div=Run"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_find_one_not_found() {
            let driver = ScriptedDriver::new();
            let err = driver.find_one(&Selector::css("ul.jp-Completer")).await;
            assert!(matches!(err, Err(LabError::NotFound { .. })));
        }

        #[tokio::test(start_paused = true)]
        async fn test_find_nth() {
            let driver = ScriptedDriver::new();
            let first = driver.add(Node::new("li.item"));
            let second = driver.add(Node::new("li.item"));
            let sel = Selector::css("li.item");
            assert_eq!(driver.find_nth(&sel, 1).await.unwrap(), second);
            assert_eq!(driver.find_nth(&sel, 0).await.unwrap(), first);
            let err = driver.find_nth(&sel, 2).await.unwrap_err();
            assert_eq!(err.to_string(), "No element matches selector li.item [2]");
        }

        #[tokio::test(start_paused = true)]
        async fn test_scoped_query_includes_nested_descendants() {
            let driver = ScriptedDriver::new();
            let cell = driver.add(Node::new("div.cell"));
            let other = driver.add(Node::new("div.cell"));
            let area = driver.add(Node::new("div.area").child_of(&cell));
            driver.add(Node::new("div.out").child_of(&area));
            driver.add(Node::new("div.out").child_of(&other));

            let sel = Selector::css("div.out");
            assert_eq!(driver.find_all_in(&cell, &sel).await.unwrap().len(), 1);
            assert_eq!(driver.find_all(&sel).await.unwrap().len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_node_appears_after_delay() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("div.toolbar").appear_after(300));
            let sel = Selector::css("div.toolbar");
            assert!(driver.find_all(&sel).await.unwrap().is_empty());
            tokio::time::sleep(Duration::from_millis(300)).await;
            assert_eq!(driver.find_all(&sel).await.unwrap().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_removed_node_goes_stale() {
            let driver = ScriptedDriver::new();
            let el = driver.add(Node::new("li.tab").removed_after(100));
            tokio::time::sleep(Duration::from_millis(100)).await;
            let err = driver.click(&el).await.unwrap_err();
            assert!(matches!(err, LabError::StaleElement { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_reactions() {
            let driver = ScriptedDriver::new();
            let menu = driver.add(Node::new("div=File"));
            let item = driver.add(Node::new("li.save").detached());
            let tab = driver.add(Node::new("li.tab"));
            driver.on_click(&menu, Reaction::Reveal(item.clone()));
            driver.on_click(&menu, Reaction::Remove(tab));

            let items = Selector::css("li.save");
            assert!(driver.find_all(&items).await.unwrap().is_empty());
            driver.click(&menu).await.unwrap();
            assert_eq!(driver.find_all(&items).await.unwrap(), vec![item]);
            assert!(driver
                .find_all(&Selector::css("li.tab"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_windows_and_keys() {
            let driver = ScriptedDriver::new();
            driver.add_window("JupyterLab");
            driver.switch_to_window("JupyterLab").await.unwrap();
            assert_eq!(driver.current_window().as_deref(), Some("JupyterLab"));
            assert!(driver.switch_to_window("Other").await.is_err());

            driver.send_keys(&[Key::Shift, Key::Tab]).await.unwrap();
            driver.send_keys(&[Key::Null]).await.unwrap();
            assert_eq!(driver.keys_sent().len(), 2);
            assert!(driver.was_called("send_keys [<Shift><Tab>]"));
            assert!(driver.was_called("send_keys [<null>]"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_actions_filter_queries() {
            let driver = ScriptedDriver::new();
            let el = driver.add(Node::new("div=Run"));
            driver.find_all(&Selector::parse("div=Run")).await.unwrap();
            driver.is_enabled(&el).await.unwrap();
            driver.click(&el).await.unwrap();
            assert_eq!(driver.actions(), vec!["click div=Run".to_string()]);
        }
    }

    mod wait_scenario_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_presence_wait_is_idempotent_when_settled() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("div.jp-BreadCrumbs"));
            let sel = Selector::css("div.jp-BreadCrumbs");

            let first = waiter().present(&driver, &sel).await.unwrap();
            let second = waiter().present(&driver, &sel).await.unwrap();
            assert_eq!(first.polls, 1);
            assert_eq!(second.polls, 1);
            assert_eq!(second.elapsed, Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_presence_wait_tracks_delayed_node() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("div.toolbar").appear_after(200));
            let result = waiter()
                .present(&driver, &Selector::css("div.toolbar"))
                .await
                .unwrap();
            assert!(result.elapsed >= Duration::from_millis(200));
            assert!(result.elapsed <= Duration::from_millis(250));
        }

        #[tokio::test(start_paused = true)]
        async fn test_absence_wait() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("li.title").removed_after(400));
            driver.add(Node::new("li.title"));
            let sel = Selector::css("li.title");

            let result = waiter()
                .count(&driver, None, &sel, CountCondition::FewerThan(2), None)
                .await
                .unwrap();
            assert!(result.elapsed >= Duration::from_millis(400));

            let err = waiter()
                .with_timeout(500)
                .count(&driver, None, &sel, CountCondition::FewerThan(1), None)
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Timed out after 500ms: fewer than 1 elements matching li.title"
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_enabled_wait_only_after_enabled() {
            let driver = ScriptedDriver::new();
            let button = driver.add(Node::new("button.accept").enabled_after(2_000));

            let start = Instant::now();
            let result = waiter().enabled(&driver, &button).await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(2_000));
            assert!(result.elapsed <= Duration::from_millis(2_050));
        }

        #[tokio::test(start_paused = true)]
        async fn test_enabled_wait_requires_visibility() {
            let driver = ScriptedDriver::new();
            let hidden = driver.add(Node::new("li.menu").hidden());
            let err = waiter()
                .with_timeout(300)
                .enabled(&driver, &hidden)
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test(start_paused = true)]
        async fn test_selector_enabled_waits_for_presence_first() {
            let driver = ScriptedDriver::new();
            let icon = driver.add(Node::new("svg.idle").appear_after(100).enabled_after(600));
            let found = waiter()
                .selector_enabled(&driver, &Selector::css("svg.idle"))
                .await
                .unwrap();
            assert_eq!(found, icon);
            assert!(driver.count_calls("query_enabled") >= 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_selector_enabled_returns_checked_node() {
            let driver = ScriptedDriver::new();
            let item = driver.add(Node::new("li.jp-mod-save").enabled_after(200));
            driver.add(Node::new("li.jp-mod-save"));

            let found = waiter()
                .selector_enabled(&driver, &Selector::css("li.jp-mod-save"))
                .await
                .unwrap();
            assert_eq!(found, item);
            // No lookup after the enabled check passed.
            let history = driver.history();
            assert_eq!(
                history.last().map(String::as_str),
                Some("query_enabled li.jp-mod-save")
            );
            assert_eq!(
                driver.count_calls("find_all li.jp-mod-save"),
                driver.count_calls("query_displayed li.jp-mod-save")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_nth_enabled_waits_for_late_item() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("li.jp-mod-save"));
            let second = driver.add(Node::new("li.jp-mod-save").appear_after(150));

            let start = Instant::now();
            let found = waiter()
                .nth_enabled(&driver, &Selector::css("li.jp-mod-save"), 1)
                .await
                .unwrap();
            assert_eq!(found, second);
            assert!(start.elapsed() >= Duration::from_millis(150));
        }

        #[tokio::test(start_paused = true)]
        async fn test_count_wait_goes_through_count() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("div.jp-Cell").appear_after(100));
            let cells = Selector::css("div.jp-Cell");

            waiter()
                .count(&driver, None, &cells, CountCondition::AtLeast(1), None)
                .await
                .unwrap();
            assert!(driver.count_calls("count div.jp-Cell") >= 2);
            assert_eq!(driver.count_calls("find_all div.jp-Cell"), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_displayed_wait_uses_message() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new("div.jp-Tooltip").hidden());
            let err = waiter()
                .with_timeout(200)
                .displayed(
                    &driver,
                    &Selector::css("div.jp-Tooltip"),
                    Some("doc tooltip is not visible"),
                )
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Timed out after 200ms: doc tooltip is not visible"
            );
        }
    }

    mod free_function_tests {
        use super::*;
        use crate::wait::{
            wait_for_count, wait_for_displayed, wait_for_enabled, wait_for_present,
            wait_for_selector_enabled,
        };

        fn options() -> WaitOptions {
            WaitOptions::new().with_timeout(1_000).with_poll_interval(50)
        }

        #[tokio::test(start_paused = true)]
        async fn test_present_and_count() {
            let driver = ScriptedDriver::new();
            let panel = driver.add(Node::new("div.jp-NotebookPanel"));
            driver.add(Node::new("div.jp-Cell").child_of(&panel).appear_after(200));
            driver.add(Node::new("div.jp-Cell").child_of(&panel).appear_after(300));
            let cells = Selector::css("div.jp-Cell");

            let result = wait_for_present(&driver, &cells, &options()).await.unwrap();
            assert!(result.elapsed >= Duration::from_millis(200));

            let result = wait_for_count(
                &driver,
                &cells,
                Some(&panel),
                CountCondition::AtLeast(2),
                &options(),
            )
            .await
            .unwrap();
            assert!(result.elapsed <= Duration::from_millis(150));
        }

        #[tokio::test(start_paused = true)]
        async fn test_enabled_variants() {
            let driver = ScriptedDriver::new();
            let button = driver.add(Node::new("button.jp-mod-accept").enabled_after(400));

            wait_for_enabled(&driver, &button, &options()).await.unwrap();
            let found = wait_for_selector_enabled(
                &driver,
                &Selector::css("button.jp-mod-accept"),
                &options(),
            )
            .await
            .unwrap();
            assert_eq!(found, button);
        }

        #[tokio::test(start_paused = true)]
        async fn test_displayed_times_out_on_budget() {
            let driver = ScriptedDriver::new();
            let start = Instant::now();
            let err = wait_for_displayed(
                &driver,
                &Selector::css("div.jp-Completer"),
                &options(),
                None,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, LabError::Timeout { ms: 1_000, .. }));
            assert!(start.elapsed() >= Duration::from_millis(1_000));
            assert!(start.elapsed() <= Duration::from_millis(1_050));
        }
    }
}

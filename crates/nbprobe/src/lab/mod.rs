//! JupyterLab page object.
//!
//! [`LabPage`] bundles the UI interactions notebook tests repeat: opening a
//! notebook from the file browser, running cells, collecting outputs,
//! triggering completion and closing the notebook with its kernel.
//!
//! Every helper follows the same shape:
//!
//! ```text
//! [wait pre] ──► locate ──► act ──► [wait post]
//! ```
//!
//! Waits go through [`Waiter`] and are bounded; actions are dispatched once.
//! A failed action fails the helper.
//!
//! ```rust,ignore
//! let lab = LabPage::new(driver);
//! lab.open_notebook("/notebooks/demo.ipynb", None).await?;
//! let cell = lab.code_cell(0).await?;
//! lab.click_run_cell().await?;
//! let lines = lab.stdout_outputs(&cell).await?;
//! lab.close_and_halt_notebook().await?;
//! ```

pub mod selectors;

use crate::config::LabConfig;
use crate::driver::{ElementHandle, Key, LabDriver};
use crate::result::LabResult;
use crate::selector::Selector;
use crate::wait::{CountCondition, Waiter};
use selectors::{
    ACCEPT_DIALOG_BUTTON, CLEAR_ALL_OUTPUTS_MENU_ITEM, CLOSE_AND_CLEANUP_MENU_ITEM, CODE_CELL,
    CODE_EDITOR, COMMAND_PALETTE_ITEM_LABEL, COMMAND_PALETTE_TAB, COMPLETER, COMPLETER_ITEM,
    DIALOG_PUBLISH_BUTTON, DIR_LISTING_ICON, DIR_LISTING_TEXT, DOCUMENT_TITLE_TAB, EDIT_MENU,
    FILE_BROWSER_CRUMBS, FILE_MENU, HOME_CRUMB, JUPYTER_WIDGET, KERNEL_IDLE_ICON,
    NOTEBOOK_TOOLBAR_BUTTON, OPTIONS_TAB_BAR_INDEX, OUTPUT_AREA_CHILD, RUN_ALL_MENU_ITEM,
    RUN_CELL_BUTTON_INDEX, RUN_ICON, RUN_MENU, SAVE_MENU_ITEM, SAVE_MENU_ITEM_INDEX, STOP_ICON,
    TAB_BAR_CONTENT, TOOLTIP, TOOLTIP_CONTENT, TREE_WIDGET_TAB,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Kind of cell output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Any rendered output, including widget views
    Any,
    /// `execute_result` output
    ExecuteResult,
    /// Text written to stdout
    Stdout,
    /// Text written to stderr
    Stderr,
    /// HTML output
    Html,
}

impl OutputKind {
    /// CSS selector of outputs of this kind inside a cell
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Any => "div.jp-OutputArea-child > div.jp-OutputArea-output",
            Self::ExecuteResult => {
                "div.jp-OutputArea-child.jp-OutputArea-executeResult > div.jp-OutputArea-output"
            }
            Self::Stdout => {
                concat!(
                    "div.jp-OutputArea-child > div.jp-OutputArea-output",
                    r#"[data-mime-type="application/vnd.jupyter.stdout"]"#
                )
            }
            Self::Stderr => {
                concat!(
                    "div.jp-OutputArea-child > div.jp-OutputArea-output",
                    r#"[data-mime-type="application/vnd.jupyter.stderr"]"#
                )
            }
            Self::Html => {
                r#"div.jp-OutputArea-child > div.jp-OutputArea-output[data-mime-type="text/html"]"#
            }
        }
    }
}

/// Non-empty segments of a notebook path, in navigation order
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Page object for the JupyterLab application
#[derive(Debug)]
pub struct LabPage<D> {
    driver: D,
    config: LabConfig,
    waiter: Waiter,
}

impl<D: LabDriver> LabPage<D> {
    /// Create a page object with default configuration
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, LabConfig::default())
    }

    /// Create a page object with custom configuration
    #[must_use]
    pub fn with_config(driver: D, config: LabConfig) -> Self {
        let waiter = Waiter::with_options(config.wait_options());
        Self {
            driver,
            config,
            waiter,
        }
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Give the driver back
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &LabConfig {
        &self.config
    }

    /// Waiter for ordinary waits
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    fn long_waiter(&self) -> Waiter {
        self.waiter.with_timeout(self.config.long_wait_timeout_ms)
    }

    async fn click_on(&self, selector: &str) -> LabResult<()> {
        let element = self.driver.find_one(&Selector::parse(selector)).await?;
        self.driver.click(&element).await
    }

    async fn click_when_enabled(&self, selector: &str) -> LabResult<()> {
        let element = self
            .waiter
            .selector_enabled(&self.driver, &Selector::parse(selector))
            .await?;
        self.driver.click(&element).await
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Open a notebook through the file browser.
    ///
    /// Navigates to the lab URL, goes to the home directory and double-clicks
    /// every segment of `short_name` (or of `path` when no short name is
    /// given). The window is widened afterwards.
    pub async fn open_notebook(&self, path: &str, short_name: Option<&str>) -> LabResult<()> {
        info!(path, "opening notebook");
        self.driver.navigate(&self.config.lab_url).await?;
        self.waiter
            .present(&self.driver, &Selector::parse(FILE_BROWSER_CRUMBS))
            .await?;
        self.waiter
            .present(&self.driver, &Selector::parse(DIR_LISTING_ICON))
            .await?;
        self.click_on(HOME_CRUMB).await?;
        self.waiter.pause(self.config.navigation_settle_ms).await;

        for name in path_segments(short_name.unwrap_or(path)) {
            info!(entry = name, "entering");
            let entry = Selector::text(DIR_LISTING_TEXT, name);
            self.waiter.present(&self.driver, &entry).await?;
            let element = self.driver.find_one(&entry).await?;
            self.driver.scroll_into_view(&element).await?;
            self.driver.double_click(&element).await?;
            self.waiter.pause(self.config.navigation_settle_ms).await;
        }

        self.increase_window_width(self.config.window_width_increase)
            .await
    }

    /// Widen the current window by `add` pixels
    pub async fn increase_window_width(&self, add: u32) -> LabResult<()> {
        let size = self.driver.window_size().await?;
        self.driver.set_window_size(size.wider_by(add)).await
    }

    /// Make the JupyterLab window current
    pub async fn switch_to_notebook_window(&self) -> LabResult<()> {
        self.driver
            .switch_to_window(&self.config.window_title)
            .await
    }

    // -------------------------------------------------------------------------
    // Menus and dialogs
    // -------------------------------------------------------------------------

    /// File ▸ Save for the open notebook
    pub async fn click_save_notebook(&self) -> LabResult<()> {
        info!("saving notebook");
        self.click_on(FILE_MENU).await?;
        let item = self
            .waiter
            .nth_enabled(
                &self.driver,
                &Selector::parse(SAVE_MENU_ITEM),
                SAVE_MENU_ITEM_INDEX,
            )
            .await?;
        self.driver.click(&item).await
    }

    async fn close_and_cleanup(&self) -> LabResult<()> {
        self.click_on(FILE_MENU).await?;
        self.click_when_enabled(CLOSE_AND_CLEANUP_MENU_ITEM).await?;
        self.click_when_enabled(ACCEPT_DIALOG_BUTTON).await
    }

    /// Close the notebook, shut its kernel down and wait for the tab to go.
    ///
    /// Outputs are not cleared first; call
    /// [`click_cell_all_output_clear`](Self::click_cell_all_output_clear)
    /// beforehand when the saved notebook must be clean.
    pub async fn close_and_halt_notebook(&self) -> LabResult<()> {
        info!("closing notebook and halting kernel");
        self.close_and_cleanup().await?;
        self.long_waiter()
            .count(
                &self.driver,
                None,
                &Selector::parse(DOCUMENT_TITLE_TAB),
                CountCondition::FewerThan(1),
                None,
            )
            .await?;
        self.waiter.pause(self.config.halt_settle_ms).await;
        Ok(())
    }

    /// Save, then close the notebook and halt its kernel
    pub async fn save_and_close_notebook(&self) -> LabResult<()> {
        self.click_save_notebook().await?;
        info!("closing notebook");
        self.close_and_cleanup().await?;
        self.waiter
            .count(
                &self.driver,
                None,
                &Selector::parse(DOCUMENT_TITLE_TAB),
                CountCondition::FewerThan(2),
                None,
            )
            .await?;
        Ok(())
    }

    /// Edit ▸ Clear All Outputs
    pub async fn click_cell_all_output_clear(&self) -> LabResult<()> {
        self.click_on(EDIT_MENU).await?;
        self.click_when_enabled(CLEAR_ALL_OUTPUTS_MENU_ITEM).await
    }

    /// Confirm a publish dialog
    pub async fn click_dialog_publish_button(&self) -> LabResult<()> {
        self.click_on(DIALOG_PUBLISH_BUTTON).await
    }

    /// Open the options window through the command palette
    pub async fn open_options_window(&self) -> LabResult<()> {
        info!(label = %self.config.options_palette_label, "opening options window");
        let palette = self
            .driver
            .find_nth(&Selector::parse(COMMAND_PALETTE_TAB), 0)
            .await?;
        self.driver.click(&palette).await?;

        let label = Selector::text(COMMAND_PALETTE_ITEM_LABEL, &self.config.options_palette_label);
        let item = self.driver.find_one(&label).await?;
        self.driver.click(&item).await?;

        let tab_bar = self
            .driver
            .find_nth(&Selector::parse(TAB_BAR_CONTENT), OPTIONS_TAB_BAR_INDEX)
            .await?;
        let tree_tab = self
            .driver
            .find_one_in(&tab_bar, &Selector::parse(TREE_WIDGET_TAB))
            .await?;
        self.driver.click(&tree_tab).await
    }

    // -------------------------------------------------------------------------
    // Kernel
    // -------------------------------------------------------------------------

    /// Run the selected cell and wait for the kernel to go idle
    pub async fn click_run_cell(&self) -> LabResult<()> {
        let buttons = Selector::parse(NOTEBOOK_TOOLBAR_BUTTON);
        self.waiter
            .count(&self.driver, None, &buttons, CountCondition::AtLeast(2), None)
            .await?;
        let run = self.driver.find_nth(&buttons, RUN_CELL_BUTTON_INDEX).await?;
        self.driver.click(&run).await?;
        self.waiter
            .selector_enabled(&self.driver, &Selector::parse(KERNEL_IDLE_ICON))
            .await?;
        Ok(())
    }

    /// Run the selected cell and return at once
    pub async fn click_run_cell_without_waiting(&self) -> LabResult<()> {
        self.click_on(RUN_ICON).await
    }

    /// Run ▸ Run All Cells, once the notebook toolbar is up
    pub async fn click_run_all_cells(&self) -> LabResult<()> {
        self.waiter
            .present(&self.driver, &Selector::parse(NOTEBOOK_TOOLBAR_BUTTON))
            .await?;
        self.click_on(RUN_MENU).await?;
        self.click_when_enabled(RUN_ALL_MENU_ITEM).await
    }

    /// Interrupt the kernel
    pub async fn click_interrupt_kernel(&self) -> LabResult<()> {
        self.click_on(STOP_ICON).await
    }

    // -------------------------------------------------------------------------
    // Cells and outputs
    // -------------------------------------------------------------------------

    /// The `index`-th code cell of the notebook
    pub async fn code_cell(&self, index: usize) -> LabResult<ElementHandle> {
        self.driver
            .find_nth(&Selector::parse(CODE_CELL), index)
            .await
    }

    /// Output area children of `cell`.
    ///
    /// With `wait` the call blocks until at least one child exists; without
    /// it the call pauses briefly and returns whatever is there, possibly
    /// nothing.
    pub async fn output_area_children(
        &self,
        cell: &ElementHandle,
        wait: bool,
    ) -> LabResult<Vec<ElementHandle>> {
        let children = Selector::parse(OUTPUT_AREA_CHILD);
        if wait {
            self.waiter.present_in(&self.driver, cell, &children).await?;
        } else {
            self.waiter.pause(self.config.output_pause_ms).await;
        }
        self.driver.find_all_in(cell, &children).await
    }

    /// Wait for outputs of `kind` in `cell` and return them
    pub async fn outputs(
        &self,
        cell: &ElementHandle,
        kind: OutputKind,
    ) -> LabResult<Vec<ElementHandle>> {
        let selector = Selector::css(kind.selector());
        self.waiter.present_in(&self.driver, cell, &selector).await?;
        self.driver.find_all_in(cell, &selector).await
    }

    /// Execute results of `cell`
    pub async fn execute_results(&self, cell: &ElementHandle) -> LabResult<Vec<ElementHandle>> {
        self.outputs(cell, OutputKind::ExecuteResult).await
    }

    /// Stdout outputs of `cell`
    pub async fn stdout_outputs(&self, cell: &ElementHandle) -> LabResult<Vec<ElementHandle>> {
        self.outputs(cell, OutputKind::Stdout).await
    }

    /// Stderr outputs of `cell`
    pub async fn stderr_outputs(&self, cell: &ElementHandle) -> LabResult<Vec<ElementHandle>> {
        self.outputs(cell, OutputKind::Stderr).await
    }

    /// HTML outputs of `cell`
    pub async fn html_outputs(&self, cell: &ElementHandle) -> LabResult<Vec<ElementHandle>> {
        self.outputs(cell, OutputKind::Html).await
    }

    /// All outputs of `cell`, widget views included
    pub async fn widget_outputs(&self, cell: &ElementHandle) -> LabResult<Vec<ElementHandle>> {
        self.outputs(cell, OutputKind::Any).await
    }

    /// Nested ipywidgets container of `cell`
    pub async fn jupyter_widget(&self, cell: &ElementHandle) -> LabResult<ElementHandle> {
        self.driver
            .find_one_in(cell, &Selector::parse(JUPYTER_WIDGET))
            .await
    }

    // -------------------------------------------------------------------------
    // Editor popups
    // -------------------------------------------------------------------------

    async fn type_and_press(
        &self,
        cell: &ElementHandle,
        code: &str,
        keys: &[Key],
    ) -> LabResult<()> {
        self.driver.scroll_into_view(cell).await?;
        let editor = self
            .driver
            .find_one_in(cell, &Selector::parse(CODE_EDITOR))
            .await?;
        self.driver.click(&editor).await?;
        self.driver.send_keys_to(cell, &[Key::text(code)]).await?;
        self.driver.send_keys(keys).await?;
        self.driver.send_keys(&[Key::Null]).await
    }

    /// Type `code` into `cell`, press Tab and return the completion entries
    pub async fn autocomplete_items(
        &self,
        cell: &ElementHandle,
        code: &str,
    ) -> LabResult<Vec<ElementHandle>> {
        self.type_and_press(cell, code, &[Key::Tab]).await?;
        self.long_waiter()
            .displayed(
                &self.driver,
                &Selector::parse(COMPLETER),
                Some("autocomplete list is not visible"),
            )
            .await?;
        self.driver.find_all(&Selector::parse(COMPLETER_ITEM)).await
    }

    /// Type `code` into `cell`, press Shift+Tab and return the tooltip body
    pub async fn doc_tooltip(&self, cell: &ElementHandle, code: &str) -> LabResult<ElementHandle> {
        self.type_and_press(cell, code, &[Key::Shift, Key::Tab])
            .await?;
        self.long_waiter()
            .displayed(
                &self.driver,
                &Selector::parse(TOOLTIP),
                Some("doc tooltip is not visible"),
            )
            .await?;
        self.driver
            .find_one(&Selector::parse(TOOLTIP_CONTENT))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LAB_URL;
    use crate::mock::{Node, Reaction, ScriptedDriver};
    use crate::result::LabError;
    use std::time::Duration;
    use tokio::time::Instant;

    fn lab(driver: ScriptedDriver) -> LabPage<ScriptedDriver> {
        LabPage::with_config(driver, LabConfig::new().with_poll_interval(50))
    }

    fn click(selector: &str) -> String {
        format!("click {selector}")
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn test_path_segments_skip_empty() {
            let segments: Vec<_> = path_segments("/work//demo.ipynb").collect();
            assert_eq!(segments, vec!["work", "demo.ipynb"]);
            assert_eq!(path_segments("").count(), 0);
        }

        #[test]
        fn test_output_selectors_are_css() {
            for kind in [
                OutputKind::Any,
                OutputKind::ExecuteResult,
                OutputKind::Stdout,
                OutputKind::Stderr,
                OutputKind::Html,
            ] {
                assert!(matches!(Selector::parse(kind.selector()), Selector::Css(_)));
            }
        }

        #[test]
        fn test_text_selectors_parse_as_text() {
            assert_eq!(Selector::parse(FILE_MENU), Selector::text("div", "File"));
            assert_eq!(
                Selector::parse(DIALOG_PUBLISH_BUTTON),
                Selector::text("div.jp-Dialog-buttonLabel", "Publish")
            );
            assert!(matches!(Selector::parse(KERNEL_IDLE_ICON), Selector::Css(_)));
        }
    }

    mod navigation_tests {
        use super::*;

        fn file_browser(driver: &ScriptedDriver) {
            driver.add(Node::new(FILE_BROWSER_CRUMBS).appear_after(300));
            driver.add(Node::new(DIR_LISTING_ICON).appear_after(400));
            driver.add(Node::new(HOME_CRUMB));
            driver.add(Node::new(Selector::text(DIR_LISTING_TEXT, "work")));
            driver.add(Node::new(Selector::text(DIR_LISTING_TEXT, "demo.ipynb")));
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_notebook_walks_short_name() {
            let driver = ScriptedDriver::new();
            file_browser(&driver);
            let lab = lab(driver);

            let start = Instant::now();
            lab.open_notebook("/home/user/work/demo.ipynb", Some("work/demo.ipynb"))
                .await
                .unwrap();
            assert!(start.elapsed() >= Duration::from_millis(400 + 3 * 1_500));

            let driver = lab.driver();
            assert_eq!(driver.current_url().as_deref(), Some(DEFAULT_LAB_URL));
            assert_eq!(
                driver.actions(),
                vec![
                    format!("navigate {DEFAULT_LAB_URL}"),
                    click(HOME_CRUMB),
                    "scroll_into_view span.jp-DirListing-itemText=work".to_string(),
                    "double_click span.jp-DirListing-itemText=work".to_string(),
                    "scroll_into_view span.jp-DirListing-itemText=demo.ipynb".to_string(),
                    "double_click span.jp-DirListing-itemText=demo.ipynb".to_string(),
                    "set_window_size 1480x800".to_string(),
                ]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_notebook_fails_on_missing_entry() {
            let driver = ScriptedDriver::new();
            file_browser(&driver);
            let lab = lab(driver);

            let err = lab
                .open_notebook("work/missing.ipynb", None)
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains("missing.ipynb"));
            assert!(!lab.driver().was_called("set_window_size"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_notebook_times_out_without_file_browser() {
            let lab = lab(ScriptedDriver::new());
            let err = lab.open_notebook("demo.ipynb", None).await.unwrap_err();
            assert!(matches!(err, LabError::Timeout { ms: 5_000, .. }));
            assert!(!lab.driver().was_called("click"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_switch_to_notebook_window() {
            let driver = ScriptedDriver::new();
            driver.add_window("Options");
            driver.add_window("JupyterLab");
            let lab = lab(driver);
            lab.switch_to_notebook_window().await.unwrap();
            assert_eq!(lab.driver().current_window().as_deref(), Some("JupyterLab"));
        }
    }

    mod menu_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_save_clicks_second_save_item_once_enabled() {
            let driver = ScriptedDriver::new();
            let file = driver.add(Node::new(FILE_MENU));
            let other = driver.add(Node::new(SAVE_MENU_ITEM).detached().enabled_after(u64::MAX));
            let notebook = driver.add(Node::new(SAVE_MENU_ITEM).detached().enabled_after(300));
            driver.on_click(&file, Reaction::Reveal(other));
            driver.on_click(&file, Reaction::Reveal(notebook));
            let lab = lab(driver);

            let start = Instant::now();
            lab.click_save_notebook().await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(300));
            assert_eq!(
                lab.driver().actions(),
                vec![click(FILE_MENU), click(SAVE_MENU_ITEM)]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_save_waits_for_menu_to_render() {
            let driver = ScriptedDriver::new();
            let file = driver.add(Node::new(FILE_MENU));
            for _ in 0..2 {
                let item = driver.add(Node::new(SAVE_MENU_ITEM).detached());
                driver.on_click(&file, Reaction::RevealAfter(item, 100));
            }
            let lab = lab(driver);

            let start = Instant::now();
            lab.click_save_notebook().await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(100));
            assert_eq!(
                lab.driver().actions(),
                vec![click(FILE_MENU), click(SAVE_MENU_ITEM)]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_save_without_notebook_item_times_out() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new(FILE_MENU));
            driver.add(Node::new(SAVE_MENU_ITEM));
            let err = lab(driver).click_save_notebook().await.unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains("docmanager:save"));
            assert!(err.to_string().contains("[1] to be enabled"));
        }

        fn closable_notebook(driver: &ScriptedDriver, tabs: usize, close_after: u64) {
            let file = driver.add(Node::new(FILE_MENU));
            let close = driver.add(Node::new(CLOSE_AND_CLEANUP_MENU_ITEM).detached());
            let accept = driver.add(Node::new(ACCEPT_DIALOG_BUTTON).detached().enabled_after(200));
            let notebook_tab = driver.add(Node::new(DOCUMENT_TITLE_TAB));
            for _ in 1..tabs {
                driver.add(Node::new(DOCUMENT_TITLE_TAB));
            }
            driver.add(Node::new(EDIT_MENU));
            driver.on_click(&file, Reaction::Reveal(close.clone()));
            driver.on_click(&close, Reaction::Reveal(accept.clone()));
            driver.on_click(&accept, Reaction::RemoveAfter(notebook_tab, close_after));
        }

        #[tokio::test(start_paused = true)]
        async fn test_close_and_halt_waits_for_tab_then_settles() {
            let driver = ScriptedDriver::new();
            closable_notebook(&driver, 1, 1_000);
            let lab = lab(driver);

            let start = Instant::now();
            lab.close_and_halt_notebook().await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(200 + 1_000 + 5_000));
            assert_eq!(
                lab.driver().actions(),
                vec![
                    click(FILE_MENU),
                    click(CLOSE_AND_CLEANUP_MENU_ITEM),
                    click(ACCEPT_DIALOG_BUTTON),
                ]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_close_does_not_clear_outputs() {
            let driver = ScriptedDriver::new();
            closable_notebook(&driver, 1, 0);
            let lab = lab(driver);
            lab.close_and_halt_notebook().await.unwrap();
            assert!(!lab.driver().was_called(&click(EDIT_MENU)));
        }

        #[tokio::test(start_paused = true)]
        async fn test_close_and_halt_uses_long_budget() {
            let driver = ScriptedDriver::new();
            closable_notebook(&driver, 1, 60_000);
            let err = lab(driver).close_and_halt_notebook().await.unwrap_err();
            match err {
                LabError::Timeout { ms, message } => {
                    assert_eq!(ms, 10_000);
                    assert!(message.contains(DOCUMENT_TITLE_TAB));
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_save_and_close_leaves_other_tabs() {
            let driver = ScriptedDriver::new();
            closable_notebook(&driver, 2, 500);
            let file = driver.find_one(&Selector::parse(FILE_MENU)).await.unwrap();
            let save_items = [
                driver.add(Node::new(SAVE_MENU_ITEM).detached()),
                driver.add(Node::new(SAVE_MENU_ITEM).detached()),
            ];
            for item in save_items {
                driver.on_click(&file, Reaction::Reveal(item));
            }
            let lab = lab(driver);

            lab.save_and_close_notebook().await.unwrap();
            assert_eq!(
                lab.driver().actions(),
                vec![
                    click(FILE_MENU),
                    click(SAVE_MENU_ITEM),
                    click(FILE_MENU),
                    click(CLOSE_AND_CLEANUP_MENU_ITEM),
                    click(ACCEPT_DIALOG_BUTTON),
                ]
            );
            let tabs = lab
                .driver()
                .find_all(&Selector::parse(DOCUMENT_TITLE_TAB))
                .await
                .unwrap();
            assert_eq!(tabs.len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_all_outputs() {
            let driver = ScriptedDriver::new();
            let edit = driver.add(Node::new(EDIT_MENU));
            let clear = driver.add(Node::new(CLEAR_ALL_OUTPUTS_MENU_ITEM).detached());
            driver.on_click(&edit, Reaction::RevealAfter(clear, 150));
            let lab = lab(driver);

            lab.click_cell_all_output_clear().await.unwrap();
            assert_eq!(
                lab.driver().actions(),
                vec![click(EDIT_MENU), click(CLEAR_ALL_OUTPUTS_MENU_ITEM)]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_options_window() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new(COMMAND_PALETTE_TAB));
            driver.add(Node::new(COMMAND_PALETTE_TAB));
            driver.add(Node::new(Selector::text(COMMAND_PALETTE_ITEM_LABEL, "BeakerX Options")));
            let bars: Vec<_> = (0..3)
                .map(|_| driver.add(Node::new(TAB_BAR_CONTENT)))
                .collect();
            driver.add(Node::new(TREE_WIDGET_TAB).child_of(&bars[0]));
            let tree = driver.add(Node::new(TREE_WIDGET_TAB).child_of(&bars[2]));
            let opened = driver.add(Node::new("div.options-panel").detached());
            driver.on_click(&tree, Reaction::Reveal(opened));
            let lab = lab(driver);

            lab.open_options_window().await.unwrap();
            let panel = lab
                .driver()
                .find_all(&Selector::css("div.options-panel"))
                .await
                .unwrap();
            assert_eq!(panel.len(), 1);
            assert_eq!(lab.driver().count_calls("click"), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_publish_dialog() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new(DIALOG_PUBLISH_BUTTON));
            let lab = lab(driver);
            lab.click_dialog_publish_button().await.unwrap();
            assert!(lab.driver().was_called("click div.jp-Dialog-buttonLabel=Publish"));
        }
    }

    mod kernel_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_run_cell_clicks_sixth_button_and_waits_for_idle() {
            let driver = ScriptedDriver::new();
            let buttons: Vec<_> = (0..6)
                .map(|_| driver.add(Node::new(NOTEBOOK_TOOLBAR_BUTTON).appear_after(300)))
                .collect();
            let idle = driver.add(Node::new(KERNEL_IDLE_ICON).detached());
            driver.on_click(&buttons[RUN_CELL_BUTTON_INDEX], Reaction::RevealAfter(idle, 400));
            let lab = lab(driver);

            let start = Instant::now();
            lab.click_run_cell().await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(700));
            assert_eq!(lab.driver().actions(), vec![click(NOTEBOOK_TOOLBAR_BUTTON)]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_all_survives_delayed_toolbar() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new(NOTEBOOK_TOOLBAR_BUTTON).appear_after(300));
            let run = driver.add(Node::new(RUN_MENU));
            let item = driver.add(Node::new(RUN_ALL_MENU_ITEM).detached().enabled_after(500));
            driver.on_click(&run, Reaction::Reveal(item));
            let lab = lab(driver);

            let start = Instant::now();
            lab.click_run_all_cells().await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(500));
            assert_eq!(
                lab.driver().actions(),
                vec![click(RUN_MENU), click(RUN_ALL_MENU_ITEM)]
            );

            let history = lab.driver().history();
            let toolbar_seen = history
                .iter()
                .position(|c| c.starts_with("count div.jp-NotebookPanel-toolbar"))
                .unwrap();
            let menu_clicked = history.iter().position(|c| c == &click(RUN_MENU)).unwrap();
            assert!(toolbar_seen < menu_clicked);
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_all_without_toolbar_times_out() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new(RUN_MENU));
            let lab = lab(driver);

            let err = lab.click_run_all_cells().await.unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains(NOTEBOOK_TOOLBAR_BUTTON));
            assert!(lab.driver().actions().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_single_click_helpers() {
            let driver = ScriptedDriver::new();
            driver.add(Node::new(RUN_ICON));
            driver.add(Node::new(STOP_ICON));
            let lab = lab(driver);

            lab.click_run_cell_without_waiting().await.unwrap();
            lab.click_interrupt_kernel().await.unwrap();
            assert_eq!(lab.driver().actions(), vec![click(RUN_ICON), click(STOP_ICON)]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_failed_click_is_not_retried() {
            let lab = lab(ScriptedDriver::new());
            let err = lab.click_interrupt_kernel().await.unwrap_err();
            assert!(matches!(err, LabError::NotFound { .. }));
            assert_eq!(lab.driver().count_calls("find_all"), 1);
        }
    }

    mod output_tests {
        use super::*;

        fn cell_with_stdout(driver: &ScriptedDriver) -> ElementHandle {
            let cell = driver.add(Node::new(CODE_CELL));
            let child = driver.add(Node::new(OUTPUT_AREA_CHILD).child_of(&cell).appear_after(250));
            driver.add(
                Node::new(Selector::css(OutputKind::Stdout.selector()))
                    .child_of(&child)
                    .appear_after(250)
                    .with_text("hello\n"),
            );
            cell
        }

        #[tokio::test(start_paused = true)]
        async fn test_code_cell_by_index() {
            let driver = ScriptedDriver::new();
            let first = driver.add(Node::new(CODE_CELL));
            let second = driver.add(Node::new(CODE_CELL));
            let lab = lab(driver);
            assert_eq!(lab.code_cell(0).await.unwrap(), first);
            assert_eq!(lab.code_cell(1).await.unwrap(), second);
            let err = lab.code_cell(3).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("No element matches selector {CODE_CELL} [3]")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_stdout_outputs_wait_for_kernel() {
            let driver = ScriptedDriver::new();
            let cell = cell_with_stdout(&driver);
            let lab = lab(driver);

            let start = Instant::now();
            let outputs = lab.stdout_outputs(&cell).await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(250));
            assert_eq!(outputs.len(), 1);
            assert_eq!(lab.driver().text(&outputs[0]).await.unwrap(), "hello\n");
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_output_kind_times_out() {
            let driver = ScriptedDriver::new();
            let cell = cell_with_stdout(&driver);
            let lab = LabPage::with_config(
                driver,
                LabConfig::new().with_wait_timeout(1_000).with_poll_interval(50),
            );
            let err = lab.stderr_outputs(&cell).await.unwrap_err();
            assert!(matches!(err, LabError::Timeout { ms: 1_000, .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_output_area_children_with_and_without_wait() {
            let driver = ScriptedDriver::new();
            let cell = cell_with_stdout(&driver);
            let lab = lab(driver);

            let start = Instant::now();
            let children = lab.output_area_children(&cell, true).await.unwrap();
            assert_eq!(children.len(), 1);
            assert!(start.elapsed() < Duration::from_millis(1_000));

            let start = Instant::now();
            let children = lab.output_area_children(&cell, false).await.unwrap();
            assert_eq!(children.len(), 1);
            assert_eq!(start.elapsed(), Duration::from_millis(1_000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unwaited_children_may_be_empty() {
            let driver = ScriptedDriver::new();
            let cell = driver.add(Node::new(CODE_CELL));
            let lab = lab(driver);
            assert!(lab.output_area_children(&cell, false).await.unwrap().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_jupyter_widget_is_scoped_to_cell() {
            let driver = ScriptedDriver::new();
            let cell = driver.add(Node::new(CODE_CELL));
            let other = driver.add(Node::new(CODE_CELL));
            let widget = driver.add(Node::new(JUPYTER_WIDGET).child_of(&cell));
            let lab = lab(driver);
            assert_eq!(lab.jupyter_widget(&cell).await.unwrap(), widget);
            assert!(lab.jupyter_widget(&other).await.is_err());
        }
    }

    mod popup_tests {
        use super::*;

        fn cell_with_editor(driver: &ScriptedDriver) -> ElementHandle {
            let cell = driver.add(Node::new(CODE_CELL));
            driver.add(Node::new(CODE_EDITOR).child_of(&cell));
            cell
        }

        #[tokio::test(start_paused = true)]
        async fn test_autocomplete_items() {
            let driver = ScriptedDriver::new();
            let cell = cell_with_editor(&driver);
            driver.add(Node::new(COMPLETER).appear_after(300));
            driver.add(Node::new(COMPLETER_ITEM).with_text("print"));
            driver.add(Node::new(COMPLETER_ITEM).with_text("property"));
            let lab = lab(driver);

            let items = lab.autocomplete_items(&cell, "pr").await.unwrap();
            assert_eq!(items.len(), 2);
            assert_eq!(
                lab.driver().keys_sent(),
                vec![
                    (Some(cell.id.clone()), vec![Key::text("pr")]),
                    (None, vec![Key::Tab]),
                    (None, vec![Key::Null]),
                ]
            );
            let actions = lab.driver().actions();
            assert_eq!(actions[0], format!("scroll_into_view {CODE_CELL}"));
            assert_eq!(actions[1], click(CODE_EDITOR));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_completer_times_out_with_message() {
            let driver = ScriptedDriver::new();
            let cell = cell_with_editor(&driver);
            driver.add(Node::new(COMPLETER).hidden());
            let lab = lab(driver);

            let start = Instant::now();
            let err = lab.autocomplete_items(&cell, "pr").await.unwrap_err();
            assert!(start.elapsed() >= Duration::from_millis(10_000));
            assert_eq!(
                err.to_string(),
                "Timed out after 10000ms: autocomplete list is not visible"
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_doc_tooltip() {
            let driver = ScriptedDriver::new();
            let cell = cell_with_editor(&driver);
            driver.add(Node::new(TOOLTIP).appear_after(200));
            let content = driver.add(Node::new(TOOLTIP_CONTENT).with_text("Docstring:"));
            let lab = lab(driver);

            let tooltip = lab.doc_tooltip(&cell, "len").await.unwrap();
            assert_eq!(tooltip, content);
            assert_eq!(lab.driver().text(&tooltip).await.unwrap(), "Docstring:");
            let keys = lab.driver().keys_sent();
            assert_eq!(keys[1], (None, vec![Key::Shift, Key::Tab]));
            assert_eq!(keys[2], (None, vec![Key::Null]));
        }

        #[tokio::test(start_paused = true)]
        async fn test_doc_tooltip_missing_editor() {
            let driver = ScriptedDriver::new();
            let cell = driver.add(Node::new(CODE_CELL));
            let lab = lab(driver);
            let err = lab.doc_tooltip(&cell, "len").await.unwrap_err();
            assert!(matches!(err, LabError::NotFound { .. }));
            assert!(lab.driver().keys_sent().is_empty());
        }
    }

    mod window_tests {
        use super::*;
        use crate::driver::WindowSize;

        #[tokio::test(start_paused = true)]
        async fn test_increase_window_width() {
            let driver = ScriptedDriver::new();
            driver.set_initial_window(WindowSize::new(1024, 768));
            let lab = lab(driver);
            lab.increase_window_width(50).await.unwrap();
            assert_eq!(
                lab.driver().window_size().await.unwrap(),
                WindowSize::new(1074, 768)
            );
        }
    }
}

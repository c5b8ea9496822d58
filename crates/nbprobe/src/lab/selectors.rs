//! DOM selectors of the JupyterLab UI.
//!
//! Strings use the same syntax as [`Selector::parse`](crate::Selector::parse):
//! `tag=Text` for exact-text matches, CSS otherwise.

// File browser
/// Breadcrumb bar of the file browser
pub const FILE_BROWSER_CRUMBS: &str = "div.p-Widget.jp-BreadCrumbs.jp-FileBrowser-crumbs";
/// Icon of a directory listing entry
pub const DIR_LISTING_ICON: &str = "span.jp-DirListing-itemIcon";
/// Home breadcrumb
pub const HOME_CRUMB: &str = "span.jp-BreadCrumbs-home";
/// Name of a directory listing entry (combined with the entry text)
pub const DIR_LISTING_TEXT: &str = "span.jp-DirListing-itemText";

// Main menu
/// File menu title
pub const FILE_MENU: &str = "div=File";
/// Edit menu title
pub const EDIT_MENU: &str = "div=Edit";
/// Run menu title
pub const RUN_MENU: &str = "div=Run";
/// Save item; the notebook's entry is the second match
pub const SAVE_MENU_ITEM: &str = r#"li[data-command="docmanager:save"]"#;
/// Index of the notebook's save item among [`SAVE_MENU_ITEM`] matches
pub const SAVE_MENU_ITEM_INDEX: usize = 1;
/// Close and shut down the kernel
pub const CLOSE_AND_CLEANUP_MENU_ITEM: &str = r#"li[data-command="filemenu:close-and-cleanup"]"#;
/// Clear all outputs
pub const CLEAR_ALL_OUTPUTS_MENU_ITEM: &str = r#"li[data-command="editmenu:clear-all"]"#;
/// Run all cells
pub const RUN_ALL_MENU_ITEM: &str = r#"li[data-command="runmenu:run-all"]"#;

// Dialogs
/// Accept button of a warning dialog
pub const ACCEPT_DIALOG_BUTTON: &str =
    "button.jp-Dialog-button.jp-mod-accept.jp-mod-warn.jp-mod-styled";
/// "Publish" dialog button label
pub const DIALOG_PUBLISH_BUTTON: &str = "div.jp-Dialog-buttonLabel=Publish";

// Notebook panel
/// Open document tab
pub const DOCUMENT_TITLE_TAB: &str = r#"li[data-type="document-title"]"#;
/// Code cell
pub const CODE_CELL: &str = "div.jp-Cell.jp-CodeCell.jp-Notebook-cell";
/// Notebook toolbar button
pub const NOTEBOOK_TOOLBAR_BUTTON: &str = "div.jp-NotebookPanel-toolbar > div.jp-ToolbarButton";
/// Index of "run cell" among [`NOTEBOOK_TOOLBAR_BUTTON`] matches
pub const RUN_CELL_BUTTON_INDEX: usize = 5;
/// Kernel status icon shown while the kernel is idle
pub const KERNEL_IDLE_ICON: &str =
    r#"div.jp-Toolbar-kernelStatus svg[data-icon="ui-components:circle-empty"]"#;
/// Toolbar run icon
pub const RUN_ICON: &str = "button.jp-ToolbarButtonComponent > span.jp-RunIcon";
/// Toolbar stop (interrupt) icon
pub const STOP_ICON: &str = "button.jp-ToolbarButtonComponent > span.jp-StopIcon";

// Cells
/// Output area child of a cell
pub const OUTPUT_AREA_CHILD: &str = "div.jp-OutputArea-child";
/// Editor of a code cell
pub const CODE_EDITOR: &str = "div.CodeMirror.cm-s-jupyter";
/// Completer popup
pub const COMPLETER: &str = "ul.jp-Completer";
/// Completer entry
pub const COMPLETER_ITEM: &str = "li.jp-Completer-item";
/// Inspector tooltip
pub const TOOLTIP: &str = "div.jp-Tooltip";
/// Inspector tooltip body
pub const TOOLTIP_CONTENT: &str = "div.jp-Tooltip-content";
/// Nested ipywidgets container
pub const JUPYTER_WIDGET: &str = "div.jupyter-widgets > div.jupyter-widgets";

// Side panels
/// Command palette side tab
pub const COMMAND_PALETTE_TAB: &str = r#"li[data-id="command-palette"]"#;
/// Command palette entry label (combined with the entry text)
pub const COMMAND_PALETTE_ITEM_LABEL: &str = "div.p-CommandPalette-itemLabel";
/// Tab bar
pub const TAB_BAR_CONTENT: &str = "ul.p-TabBar-content";
/// Index of the tab bar holding the tree widget
pub const OPTIONS_TAB_BAR_INDEX: usize = 2;
/// Options tree widget tab
pub const TREE_WIDGET_TAB: &str = r#"li[data-id="beakerx-tree-widget"]"#;

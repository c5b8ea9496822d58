//! Scripted JupyterLab Example
//!
//! Drives `LabPage` against the in-memory `ScriptedDriver`, so it runs
//! without a browser or a JupyterLab server:
//! - open a notebook through the file browser
//! - run a cell and wait for the kernel to go idle
//! - read its stdout output
//! - see what a timeout looks like
//!
//! # Running
//!
//! ```bash
//! cargo run --example scripted_lab -p nbprobe
//! ```

use nbprobe::lab::selectors::{
    DIR_LISTING_ICON, DIR_LISTING_TEXT, FILE_BROWSER_CRUMBS, HOME_CRUMB, KERNEL_IDLE_ICON,
    NOTEBOOK_TOOLBAR_BUTTON, RUN_CELL_BUTTON_INDEX,
};
use nbprobe::mock::{Node, Reaction, ScriptedDriver};
use nbprobe::{
    ElementHandle, LabConfig, LabDriver, LabPage, LabResult, OutputKind, Selector, WaitOptions,
    Waiter,
};
use std::time::Instant;

#[tokio::main]
async fn main() -> LabResult<()> {
    println!("=== nbprobe Scripted JupyterLab Example ===\n");

    let driver = ScriptedDriver::new();
    let cell = build_lab(&driver);
    let config = LabConfig::new()
        .with_wait_timeout(2_000)
        .with_poll_interval(50)
        .with_settle_pauses(100, 100, 100);
    let lab = LabPage::with_config(driver, config);

    demo_open_notebook(&lab).await?;
    demo_run_cell(&lab, &cell).await?;
    demo_timeout().await;

    println!("\n=== Scripted JupyterLab Example Complete ===");
    Ok(())
}

/// A file browser, a notebook toolbar and one code cell with delayed output
fn build_lab(driver: &ScriptedDriver) -> ElementHandle {
    driver.add(Node::new(FILE_BROWSER_CRUMBS).appear_after(200));
    driver.add(Node::new(DIR_LISTING_ICON).appear_after(250));
    driver.add(Node::new(HOME_CRUMB));
    driver.add(Node::new(Selector::text(DIR_LISTING_TEXT, "demo.ipynb")));

    let buttons: Vec<_> = (0..6)
        .map(|_| driver.add(Node::new(NOTEBOOK_TOOLBAR_BUTTON)))
        .collect();
    let idle = driver.add(Node::new(KERNEL_IDLE_ICON).detached());

    let cell = driver.add(Node::new("div.jp-CodeCell"));
    let output = driver.add(
        Node::new(Selector::css(OutputKind::Stdout.selector()))
            .with_text("hello from the kernel")
            .child_of(&cell)
            .detached(),
    );
    driver.on_click(&buttons[RUN_CELL_BUTTON_INDEX], Reaction::RevealAfter(idle, 300));
    driver.on_click(&buttons[RUN_CELL_BUTTON_INDEX], Reaction::RevealAfter(output, 300));
    cell
}

async fn demo_open_notebook(lab: &LabPage<ScriptedDriver>) -> LabResult<()> {
    println!("1. Opening demo.ipynb through the file browser");
    let start = Instant::now();
    lab.open_notebook("demo.ipynb", None).await?;
    println!("   opened in {:?}", start.elapsed());
    for action in lab.driver().actions() {
        println!("   - {action}");
    }
    Ok(())
}

async fn demo_run_cell(
    lab: &LabPage<ScriptedDriver>,
    cell: &ElementHandle,
) -> LabResult<()> {
    println!("\n2. Running the cell");
    let start = Instant::now();
    lab.click_run_cell().await?;
    println!("   kernel idle after {:?}", start.elapsed());

    for output in lab.stdout_outputs(cell).await? {
        println!("   stdout: {}", lab.driver().text(&output).await?);
    }
    Ok(())
}

async fn demo_timeout() {
    println!("\n3. Waiting for something that never shows up");
    let driver = ScriptedDriver::new();
    let waiter = Waiter::with_options(WaitOptions::new().with_timeout(300).with_poll_interval(50));
    match waiter
        .present(&driver, &Selector::parse("div.jp-Dialog"))
        .await
    {
        Ok(_) => println!("   unexpected: dialog found"),
        Err(e) => println!("   {e}"),
    }
}

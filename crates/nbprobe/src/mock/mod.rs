//! Scripted drivers for testing page objects without a browser.
//!
//! ```rust,ignore
//! use nbprobe::mock::{Node, Reaction, ScriptedDriver};
//!
//! let driver = ScriptedDriver::new();
//! let menu = driver.add(Node::new("div=Run"));
//! let item = driver.add(Node::new(r#"li[data-command="runmenu:run-all"]"#).detached());
//! driver.on_click(&menu, Reaction::Reveal(item));
//! ```

mod scripted_driver;

pub use scripted_driver::{Node, Reaction, ScriptedDriver};

//! Selectors for locating elements in the notebook UI.
//!
//! Selectors are immutable query strings. They identify zero, one or many
//! elements at query time; nothing guarantees a selector matches anything.
//!
//! Three syntaxes are understood, following the WebDriverIO conventions the
//! JupyterLab test suites are written in:
//!
//! - `div=File` matches a `div` whose whitespace-normalized text is `File`
//! - `div*=Fil` matches a `div` whose text contains `Fil`
//! - `//li[@data-id]`, `(//li)[2]`, `./span` are XPath
//! - everything else is CSS, including attribute selectors such as
//!   `li[data-command="docmanager:save"]`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "div.jp-Cell")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Element-with-text selector
    Text {
        /// Tag name with optional `.class` suffixes (e.g., "span.jp-DirListing-itemText")
        element: String,
        /// Text to match
        text: String,
        /// Whole-text match when true, substring match otherwise
        exact: bool,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create an exact element-with-text selector
    #[must_use]
    pub fn text(element: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            element: element.into(),
            text: text.into(),
            exact: true,
        }
    }

    /// Create a partial element-with-text selector
    #[must_use]
    pub fn partial_text(element: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            element: element.into(),
            text: text.into(),
            exact: false,
        }
    }

    /// Parse a WebDriverIO-style selector string
    #[must_use]
    pub fn parse(input: &str) -> Self {
        if input.starts_with('/')
            || input.starts_with('(')
            || input.starts_with("./")
            || input.starts_with("../")
        {
            return Self::XPath(input.to_string());
        }

        if let Some((prefix, text)) = input.split_once('=') {
            let (element, exact) = match prefix.strip_suffix('*') {
                Some(element) => (element, false),
                None => (prefix, true),
            };
            if is_element_prefix(element) {
                return Self::Text {
                    element: element.to_string(),
                    text: text.to_string(),
                    exact,
                };
            }
        }

        Self::Css(input.to_string())
    }

    /// CSS text when this is a CSS selector
    #[must_use]
    pub fn as_css(&self) -> Option<&str> {
        match self {
            Self::Css(css) => Some(css),
            _ => None,
        }
    }

    /// Render as an XPath expression rooted at the document.
    ///
    /// Returns `None` for CSS selectors, which have no general translation.
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Self::Css(_) => None,
            Self::XPath(xpath) => Some(xpath.clone()),
            Self::Text {
                element,
                text,
                exact,
            } => {
                let mut parts = element.split('.');
                let tag = match parts.next() {
                    Some(tag) if !tag.is_empty() => tag,
                    _ => "*",
                };
                let mut xpath = format!("//{tag}");
                for class in parts.filter(|c| !c.is_empty()) {
                    xpath.push_str(&format!(
                        "[contains(concat(' ', normalize-space(@class), ' '), ' {class} ')]"
                    ));
                }
                let literal = xpath_literal(text);
                if *exact {
                    xpath.push_str(&format!("[normalize-space(.) = {literal}]"));
                } else {
                    xpath.push_str(&format!("[contains(., {literal})]"));
                }
                Some(xpath)
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) | Self::XPath(s) => f.write_str(s),
            Self::Text {
                element,
                text,
                exact: true,
            } => write!(f, "{element}={text}"),
            Self::Text {
                element,
                text,
                exact: false,
            } => write!(f, "{element}*={text}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}

/// Tag name with optional class suffixes, nothing CSS-structural
fn is_element_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && !prefix.starts_with('.')
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Quote a string as an XPath 1.0 literal
fn xpath_literal(s: &str) -> String {
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    let pieces: Vec<String> = s.split('"').map(|p| format!("\"{p}\"")).collect();
    format!("concat({})", pieces.join(", '\"', "))
}

//! Browser automation for the outlet locator.
//!
//! Provides a Chromium session behind the [`PageActions`] and [`TabHost`]
//! seams, container discovery in the results region, and capture of the
//! navigation links that carry outlet coordinates.

pub mod actions;
pub mod capture;
pub mod error;
pub mod fingerprint;
pub mod locator;
pub mod session;

pub use actions::{is_navigation_url, BrowserPage, ElementHandle, PageActions, TabHost};
pub use capture::NavigationCapture;
pub use error::{BrowserError, Result};
pub use locator::ContainerLocator;
pub use session::BrowserSession;

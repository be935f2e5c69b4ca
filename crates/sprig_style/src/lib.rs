//! Sprig Style Pipeline
//!
//! Acquires and parses the stylesheets that components adopt into their
//! isolated render roots:
//!
//! - **Parser**: nom-based CSS subset parser producing a [`Stylesheet`]
//! - **Sources**: [`FileSource`], [`MemorySource`] and, with the `network`
//!   feature, `HttpSource`
//! - **Loader**: [`StyleLoader`] fetches and parses in one asynchronous step
//!
//! # Example
//!
//! ```rust
//! use sprig_style::{MemorySource, StyleLoader};
//!
//! # tokio_test_block(async {
//! let loader = StyleLoader::new(MemorySource::new().with("/app.css", ".a { color: red; }"));
//! let sheet = loader.load("/app.css").await.unwrap();
//! assert_eq!(sheet.len(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod loader;
pub mod parser;
pub mod source;

pub use error::{Result, StyleError};
pub use loader::StyleLoader;
pub use parser::{AtRule, AtRuleBody, CssRule, Declaration, ParseError, StyleRule, Stylesheet};
#[cfg(feature = "network")]
pub use source::HttpSource;
pub use source::{FileSource, MemorySource, StyleSource};

//! # compact-core
//!
//! Groups individually authored source files into named collections ("namespaces"), resolves
//! each file through a layered search path, and compacts one or more namespaces into a single
//! output artifact that is produced at most once per distinct combination.
//!
//! ## Overview
//!
//! - **[`namespace`]**: the write-once [`Registry`](namespace::Registry) of namespaces and the
//!   chainable [`add_file`](namespace::NamespaceMut::add_file) handle
//! - **[`resolve`]**: the resolution chain (override directory, source root, literal path)
//! - **[`compact`]**: [`Compact`](compact::Compact), which concatenates, transforms and writes
//!   groups in production mode, or copies them file by file in debug mode
//! - **[`cache`]**: the per-group in-flight/ready state behind production compaction
//! - **[`group`]**: group identity and output naming
//! - **[`middleware`]**: the per-request adapter returning references and `<script>` tags
//! - **[`config`]**: construction options and declarative namespaces from TOML
//! - **`service`** (feature `service`): axum middleware exposing the adapter to handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compact_core::{compact::Compact, config::CompactConfig, group::Group};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), compact_core::CompactError> {
//!     let mut compact = Compact::new(CompactConfig::new("./assets", "./public/js").with_web_path("/js"))?;
//!
//!     compact.add_namespace("global")?.add_file("a.js")?.add_file("b.js")?;
//!     compact.add_namespace("profile")?.add_file("c.js")?;
//!
//!     // Written once as public/js/global-profile.js; later calls return the cached reference.
//!     let refs = compact.compact_group(&Group::new(["global", "profile"])).await?;
//!     assert_eq!(refs, vec!["/js/global-profile.js".to_string()]);
//!     Ok(())
//! }
//! ```
//!
//! ## Per-request use
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use compact_core::{compact::Compact, group::Group, middleware::CompactMiddleware};
//! # async fn example(compact: Compact) -> Result<(), compact_core::CompactError> {
//! let middleware = CompactMiddleware::new(
//!     Arc::new(compact),
//!     vec![Group::new(["global", "profile"]), Group::new(["blog"])],
//! )?;
//! let assets = middleware.run().await?;
//! println!("{}", assets.js_html());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **default**: registry, compaction, middleware adapter
//! - **service**: axum integration (`service::compact_assets`, `service::dev_router`)
//! - **bin**: the `compact` command line tool

pub mod cache;
pub mod compact;
pub mod config;
pub mod error;
pub mod group;
pub mod middleware;
pub mod namespace;
pub mod resolve;
#[cfg(feature = "service")]
pub mod service;
#[cfg(test)]
mod tests;
pub mod transform;

pub use error::*;

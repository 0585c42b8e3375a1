//! `itex_core` is the core library for the itex iteration engine. Given a set
//! of items (an explicit list, a delimited string, items carrying their own
//! properties, or the entries of a scanned folder tree) it runs a pipeline of
//! actions once per item, replacing placeholders such as `@item@` or
//! `@item.basename@` in every action's configuration.
//!
//! ## Processing Pipeline
//!
//! ```text
//! itex.toml
//!   → Config (items, placeholder syntax, defaults, actions)
//!   → Item source (exactly one of list / content / with_properties / folder)
//!   → Directory scanner (glob include/exclude, bounded depth, sort order)
//!   → Engine, for every item × action:
//!       merge configuration → substitute placeholders → inject context
//!       → invoke action → restore context → apply fail-fast / fail-at-end
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `itex.toml`.
//! - [`item`]: Items and the mutually exclusive item sources.
//! - [`scanner`]: Glob filtered, depth bounded directory scanning.
//! - [`placeholder`]: Placeholder syntax and the derived value resolvers.
//! - [`node`]: Hierarchical action configuration trees, merging and
//!   placeholder resolution.
//! - [`context`]: The shared property store and its scoped overlay.
//! - [`action`]: Action identities, the defaults table and the invoker
//!   boundary.
//! - [`exec`]: The built-in `itex:exec` process action.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use itex_core::ExecInvoker;
//! use itex_core::ItexConfig;
//! use itex_core::IterationEngine;
//! use itex_core::SharedContext;
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let config = ItexConfig::load(root).unwrap().unwrap_or_default();
//! let engine = IterationEngine::from_config(&config, root).unwrap();
//! let mut context = SharedContext::from(config.properties.clone());
//! let mut invoker = ExecInvoker::new(root);
//!
//! let summary = engine.run(&mut context, &mut invoker).unwrap();
//! println!("{} invocation(s)", summary.invocations);
//! ```

pub use action::*;
pub use config::ItexConfig;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use exec::*;
pub use item::*;
pub use node::*;
pub use placeholder::*;
pub use scanner::*;

pub mod action;
pub mod config;
pub mod context;
mod engine;
#[allow(unused_assignments)]
mod error;
pub mod exec;
pub mod item;
pub mod node;
pub mod placeholder;
pub mod scanner;

#[cfg(test)]
mod __fixtures;

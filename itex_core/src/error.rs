use miette::Diagnostic;
use thiserror::Error;

use crate::action::InvocationError;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ItexError {
	#[error(transparent)]
	#[diagnostic(code(itex::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(itex::config_parse),
		help("check that itex.toml is valid TOML with an [items] section and [[actions]] entries")
	)]
	ConfigParse(String),

	#[error("no config file found in `{path}`")]
	#[diagnostic(
		code(itex::config_not_found),
		help("run `itex init` to create an itex.toml, or pass one with `--config`")
	)]
	ConfigNotFound { path: String },

	#[error("invalid value for `{field}`: {reason}")]
	#[diagnostic(code(itex::invalid_config))]
	InvalidConfig { field: String, reason: String },

	#[error("more than one item source configured: {}", sources.join(", "))]
	#[diagnostic(
		code(itex::multiple_item_sources),
		help(
			"use only one of `items.list`, `items.with_properties`, `items.content` or \
			 `items.folder`"
		)
	)]
	MultipleItemSources { sources: Vec<&'static str> },

	#[error("the folder to scan does not exist or cannot be read: `{path}`")]
	#[diagnostic(code(itex::scan_root))]
	ScanRoot { path: String },

	#[error("cannot scan directory `{path}`: {reason}")]
	#[diagnostic(code(itex::scan_failed))]
	Scan { path: String, reason: String },

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(code(itex::invalid_glob))]
	InvalidGlob { pattern: String, reason: String },

	#[error("invalid placeholder syntax: {0}")]
	#[diagnostic(
		code(itex::invalid_placeholder),
		help("`iterator_name` must not be empty")
	)]
	InvalidPlaceholder(String),

	#[error("invalid action id `{0}`")]
	#[diagnostic(
		code(itex::invalid_action_id),
		help("action ids have the form `<namespace>:<name>`, e.g. `itex:exec`")
	)]
	InvalidActionId(String),

	#[error("unknown version for action `{action}`")]
	#[diagnostic(
		code(itex::unknown_action_version),
		help("define the version on the action itself or in `[defaults.\"{action}\"]`")
	)]
	UnknownActionVersion { action: String },

	#[error("action `{action}` failed for item `{item}`: {message}")]
	#[diagnostic(code(itex::action_failed))]
	ActionFailed {
		item: String,
		action: String,
		message: String,
	},

	#[error("action `{action}` could not be invoked for item `{item}`")]
	#[diagnostic(code(itex::invocation))]
	Invocation {
		item: String,
		action: String,
		#[source]
		source: InvocationError,
	},

	#[error("failures during iteration: {} action(s) failed", failures.len())]
	#[diagnostic(
		code(itex::iteration_failures),
		help("each failure has been logged above")
	)]
	IterationFailures { failures: Vec<IterationFailure> },
}

impl ItexError {
	/// Returns `true` for errors produced by an action reporting failure, as
	/// opposed to configuration or invocation problems.
	pub fn is_action_failure(&self) -> bool {
		matches!(
			self,
			Self::ActionFailed { .. } | Self::IterationFailures { .. }
		)
	}
}

/// A single per-iteration failure collected while running with
/// `fail_at_end` enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationFailure {
	/// Name of the item being processed.
	pub item: String,
	/// Display form of the action identity with version and goal.
	pub action: String,
	/// Failure message reported by the action.
	pub message: String,
}

impl std::fmt::Display for IterationFailure {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "({}) {}: {}", self.item, self.action, self.message)
	}
}

pub type ItexResult<T> = Result<T, ItexError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

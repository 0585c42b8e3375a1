use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use thiserror::Error;

use crate::ItexError;
use crate::ItexResult;
use crate::context::SharedContext;
use crate::item::Item;
use crate::node::ConfigNode;

/// Identity of an action, written `<namespace>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId {
	namespace: String,
	name: String,
}

impl ActionId {
	pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			name: name.into(),
		}
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Display for ActionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.namespace, self.name)
	}
}

impl FromStr for ActionId {
	type Err = ItexError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let Some((namespace, name)) = value.split_once(':') else {
			return Err(ItexError::InvalidActionId(value.to_string()));
		};

		let namespace = namespace.trim();
		let name = name.trim();
		if namespace.is_empty() || name.is_empty() || name.contains(':') {
			return Err(ItexError::InvalidActionId(value.to_string()));
		}

		Ok(Self::new(namespace, name))
	}
}

/// One configured step of the per-item pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDefinition {
	pub id: ActionId,
	/// Declared version. When absent it is looked up in the
	/// [`ActionDefaults`] table.
	pub version: Option<String>,
	pub goal: String,
	/// Configuration template; merged over the base configuration from the
	/// defaults table and resolved for every item.
	pub configuration: Option<ConfigNode>,
}

impl ActionDefinition {
	pub fn new(id: ActionId, goal: impl Into<String>) -> Self {
		Self {
			id,
			version: None,
			goal: goal.into(),
			configuration: None,
		}
	}

	#[must_use]
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());
		self
	}

	#[must_use]
	pub fn with_configuration(mut self, configuration: ConfigNode) -> Self {
		self.configuration = Some(configuration);
		self
	}
}

/// Version and base configuration applied to an action that does not declare
/// them itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionDefault {
	pub version: Option<String>,
	pub configuration: Option<ConfigNode>,
}

/// Table of [`ActionDefault`]s keyed by action identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionDefaults {
	entries: IndexMap<ActionId, ActionDefault>,
}

impl ActionDefaults {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: ActionId, default: ActionDefault) {
		self.entries.insert(id, default);
	}

	#[must_use]
	pub fn with(mut self, id: ActionId, default: ActionDefault) -> Self {
		self.insert(id, default);
		self
	}

	pub fn lookup_version(&self, id: &ActionId) -> Option<&str> {
		self.entries.get(id).and_then(|entry| entry.version.as_deref())
	}

	pub fn base_configuration(&self, id: &ActionId) -> Option<&ConfigNode> {
		self.entries
			.get(id)
			.and_then(|entry| entry.configuration.as_ref())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Everything an invoker needs to run one action for one item.
#[derive(Debug, Clone, Copy)]
pub struct InvocationRequest<'a> {
	pub id: &'a ActionId,
	pub version: &'a str,
	pub goal: &'a str,
	/// The merged configuration with all placeholders resolved.
	pub configuration: &'a ConfigNode,
	pub item: &'a Item,
}

impl fmt::Display for InvocationRequest<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.id, self.version, self.goal)
	}
}

/// Result of an action that could be invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionOutcome {
	Success,
	/// The action ran and reported failure. Subject to `fail_at_end`.
	Failure(String),
}

impl ActionOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success)
	}
}

/// The action could not be invoked at all. Always aborts the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvocationError {
	#[error("unknown action `{0}`")]
	UnknownAction(String),

	#[error("action `{action}` has no goal `{goal}`")]
	UnknownGoal { action: String, goal: String },

	#[error("goal `{goal}` of action `{action}` requires the `{parameter}` parameter")]
	MissingParameter {
		action: String,
		goal: String,
		parameter: String,
	},

	#[error("failed to start `{program}`: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},
}

/// Locates and runs actions by identity.
pub trait ActionInvoker {
	/// Run the action described by `request`. `context` is the shared property
	/// store including the current item's injected properties.
	fn invoke(
		&mut self,
		request: &InvocationRequest<'_>,
		context: &SharedContext,
	) -> Result<ActionOutcome, InvocationError>;
}

/// Resolve the effective version of `action`, consulting `defaults` when the
/// action does not declare one.
pub fn resolve_version<'a>(
	action: &'a ActionDefinition,
	defaults: &'a ActionDefaults,
) -> ItexResult<&'a str> {
	action
		.version
		.as_deref()
		.or_else(|| defaults.lookup_version(&action.id))
		.ok_or_else(|| {
			ItexError::UnknownActionVersion {
				action: action.id.to_string(),
			}
		})
}

/// The action's configuration merged over its base configuration from
/// `defaults`, the action's own configuration winning.
pub fn merged_configuration(action: &ActionDefinition, defaults: &ActionDefaults) -> ConfigNode {
	match (
		action.configuration.as_ref(),
		defaults.base_configuration(&action.id),
	) {
		(Some(own), Some(base)) => ConfigNode::merge(own, base),
		(Some(own), None) => own.clone(),
		(None, Some(base)) => base.clone(),
		(None, None) => ConfigNode::configuration(),
	}
}

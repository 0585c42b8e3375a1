use std::fs;
use std::path::Path;

use crate::ActionDefinition;
use crate::ActionId;
use crate::ActionInvoker;
use crate::ActionOutcome;
use crate::ConfigNode;
use crate::InvocationError;
use crate::InvocationRequest;
use crate::IterationEngine;
use crate::PlaceholderPattern;
use crate::SharedContext;
use crate::config::ItemsConfig;

/// What a [`RecordingInvoker`] saw for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
	pub item: String,
	pub action: String,
	pub configuration: ConfigNode,
	/// Snapshot of the shared context during the invocation.
	pub context: Vec<(String, String)>,
}

/// Invoker that records every request and fails for selected items.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
	pub calls: Vec<Recorded>,
	/// Items for which the action reports a domain failure.
	pub failing_items: Vec<String>,
	/// Items for which the action cannot be invoked at all.
	pub broken_items: Vec<String>,
}

impl RecordingInvoker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing(items: &[&str]) -> Self {
		Self {
			failing_items: items.iter().map(ToString::to_string).collect(),
			..Self::default()
		}
	}

	pub fn broken(items: &[&str]) -> Self {
		Self {
			broken_items: items.iter().map(ToString::to_string).collect(),
			..Self::default()
		}
	}

	pub fn items(&self) -> Vec<&str> {
		self.calls.iter().map(|call| call.item.as_str()).collect()
	}

	/// The value of child `name` in every recorded configuration.
	pub fn values_of(&self, name: &str) -> Vec<String> {
		self.calls
			.iter()
			.filter_map(|call| call.configuration.child_value(name))
			.map(ToString::to_string)
			.collect()
	}
}

impl ActionInvoker for RecordingInvoker {
	fn invoke(
		&mut self,
		request: &InvocationRequest<'_>,
		context: &SharedContext,
	) -> Result<ActionOutcome, InvocationError> {
		self.calls.push(Recorded {
			item: request.item.name.clone(),
			action: request.to_string(),
			configuration: request.configuration.clone(),
			context: context
				.iter()
				.map(|(key, value)| (key.to_string(), value.to_string()))
				.collect(),
		});

		if self.broken_items.contains(&request.item.name) {
			return Err(InvocationError::UnknownGoal {
				action: request.id.to_string(),
				goal: request.goal.to_string(),
			});
		}

		if self.failing_items.contains(&request.item.name) {
			return Ok(ActionOutcome::Failure(format!(
				"{} failed",
				request.item.name
			)));
		}

		Ok(ActionOutcome::Success)
	}
}

pub fn echo_id() -> ActionId {
	ActionId::new("test", "echo")
}

/// A `configuration` node with one child per `(name, value)` pair.
pub fn configuration(children: &[(&str, &str)]) -> ConfigNode {
	children
		.iter()
		.fold(ConfigNode::configuration(), |node, (name, value)| {
			node.with_child(ConfigNode::new(*name).with_value(*value))
		})
}

/// `[items]` with an explicit list.
pub fn list_items(names: &[&str]) -> ItemsConfig {
	ItemsConfig {
		list: Some(names.iter().map(ToString::to_string).collect()),
		..ItemsConfig::default()
	}
}

/// The `test:echo` action, version `1`, goal `run`, with one `command` child.
pub fn echo_action(command: &str) -> ActionDefinition {
	ActionDefinition::new(echo_id(), "run")
		.with_version("1")
		.with_configuration(configuration(&[("command", command)]))
}

/// An engine running `echo_action(command)` over `items`.
pub fn echo_engine(items: ItemsConfig, command: &str) -> IterationEngine {
	IterationEngine::new(PlaceholderPattern::default(), vec![echo_action(command)]).with_items(items)
}

/// Create every directory in `dirs` and every file in `files` below `root`.
pub fn create_tree(root: &Path, dirs: &[&str], files: &[&str]) {
	for dir in dirs {
		fs::create_dir_all(root.join(dir)).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}

	for file in files {
		let path = root.join(file);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
		}
		fs::write(path, "").unwrap_or_else(|e| panic!("write: {e}"));
	}
}

/// Paths as `/` separated strings for comparison.
pub fn as_strings(paths: &[std::path::PathBuf]) -> Vec<String> {
	paths
		.iter()
		.map(|path| path.to_string_lossy().replace('\\', "/"))
		.collect()
}

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;
use tracing::info;

use crate::action::ActionId;
use crate::action::ActionInvoker;
use crate::action::ActionOutcome;
use crate::action::InvocationError;
use crate::action::InvocationRequest;
use crate::context::SharedContext;
use crate::node::ConfigNode;

/// Namespace of the built-in actions.
pub const EXEC_NAMESPACE: &str = "itex";
/// Name of the built-in process action.
pub const EXEC_NAME: &str = "exec";
/// Runs `command` through the platform shell.
pub const SHELL_GOAL: &str = "shell";
/// Runs `program` with `args` directly.
pub const EXEC_GOAL: &str = "exec";

/// Identity of the built-in process action, `itex:exec`.
pub fn exec_action_id() -> ActionId {
	ActionId::new(EXEC_NAMESPACE, EXEC_NAME)
}

/// Invoker for the built-in `itex:exec` action. Any version is accepted.
///
/// Recognized configuration children:
///
/// - `command`: shell command line, required by the `shell` goal.
/// - `program` and `args`: executable and its arguments, used by the `exec`
///   goal.
/// - `cwd`: working directory, resolved against the project root.
/// - `env`: table of extra environment variables.
///
/// Every shared context entry is exported to the child environment before the
/// `env` table is applied.
#[derive(Debug, Clone)]
pub struct ExecInvoker {
	root: PathBuf,
}

impl ExecInvoker {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn command_for(&self, request: &InvocationRequest<'_>) -> Result<(String, Command), InvocationError> {
		let configuration = request.configuration;

		match request.goal {
			SHELL_GOAL => {
				let line = required(request, "command")?;
				let mut command = shell_command();
				command.arg(line);
				Ok((line.to_string(), command))
			}
			EXEC_GOAL => {
				let program = required(request, "program")?;
				let mut command = Command::new(program);
				command.args(arguments(configuration));
				Ok((program.to_string(), command))
			}
			goal => {
				Err(InvocationError::UnknownGoal {
					action: request.id.to_string(),
					goal: goal.to_string(),
				})
			}
		}
	}
}

impl ActionInvoker for ExecInvoker {
	fn invoke(
		&mut self,
		request: &InvocationRequest<'_>,
		context: &SharedContext,
	) -> Result<ActionOutcome, InvocationError> {
		if *request.id != exec_action_id() {
			return Err(InvocationError::UnknownAction(request.id.to_string()));
		}

		let (program, mut command) = self.command_for(request)?;
		let configuration = request.configuration;

		let cwd = configuration
			.child_value("cwd")
			.map_or_else(|| self.root.clone(), |cwd| self.root.join(cwd));
		command.current_dir(&cwd);

		for (key, value) in context.iter() {
			command.env(key, value);
		}

		if let Some(env) = configuration.child("env") {
			for variable in &env.children {
				command.env(&variable.name, variable.value().unwrap_or_default());
			}
		}

		debug!(program = %program, cwd = %cwd.display(), "spawn process");
		let status = command
			.status()
			.map_err(|source| InvocationError::Spawn { program, source })?;

		if status.success() {
			return Ok(ActionOutcome::Success);
		}

		let message = match status.code() {
			Some(code) => format!("command exited with status {code}"),
			None => "command was terminated by a signal".to_string(),
		};

		Ok(ActionOutcome::Failure(message))
	}
}

fn required<'a>(request: &InvocationRequest<'a>, parameter: &str) -> Result<&'a str, InvocationError> {
	request
		.configuration
		.child_value(parameter)
		.filter(|value| !value.trim().is_empty())
		.ok_or_else(|| {
			InvocationError::MissingParameter {
				action: request.id.to_string(),
				goal: request.goal.to_string(),
				parameter: parameter.to_string(),
			}
		})
}

/// The `args` child as a list. An array yields one argument per `entry`, a
/// plain value yields a single argument.
fn arguments(configuration: &ConfigNode) -> Vec<&str> {
	let Some(args) = configuration.child("args") else {
		return Vec::new();
	};

	if args.children.is_empty() {
		return args.value().into_iter().collect();
	}

	args.children.iter().filter_map(ConfigNode::value).collect()
}

#[cfg(windows)]
fn shell_command() -> Command {
	let mut command = Command::new("cmd");
	command.arg("/C");
	command
}

#[cfg(not(windows))]
fn shell_command() -> Command {
	let mut command = Command::new("sh");
	command.arg("-c");
	command
}

/// Invoker that only reports what would run.
#[derive(Debug, Clone, Default)]
pub struct DryRunInvoker {
	/// Number of invocations seen so far.
	pub invocations: usize,
}

impl DryRunInvoker {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ActionInvoker for DryRunInvoker {
	fn invoke(
		&mut self,
		request: &InvocationRequest<'_>,
		_context: &SharedContext,
	) -> Result<ActionOutcome, InvocationError> {
		self.invocations += 1;
		info!("dry run: {request} {}", request.configuration);
		Ok(ActionOutcome::Success)
	}
}

use std::iter;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::ItexError;
use crate::ItexResult;
use crate::IterationFailure;
use crate::action::ActionDefaults;
use crate::action::ActionDefinition;
use crate::action::ActionInvoker;
use crate::action::ActionOutcome;
use crate::action::InvocationRequest;
use crate::action::merged_configuration;
use crate::action::resolve_version;
use crate::config::ItemsConfig;
use crate::config::ItexConfig;
use crate::context::ContextOverlay;
use crate::context::SharedContext;
use crate::item::Item;
use crate::item::resolve_items;
use crate::placeholder::PlaceholderPattern;

/// Logged when the run is bypassed with `skip`.
pub const SKIP_MESSAGE: &str = "Skip by user request.";
/// Logged when no item source is configured.
pub const NOTHING_CONFIGURED_MESSAGE: &str =
	"Neither items, with_properties, content nor folder have been set.";

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
	/// The run was bypassed with `skip`.
	pub skipped: bool,
	/// Number of items the pipeline ran for.
	pub items: usize,
	/// Number of actions invoked across all items.
	pub invocations: usize,
}

/// Runs the configured actions once per item.
///
/// For every item and every action, in declared order, the engine merges the
/// action's configuration over its defaults, substitutes placeholders for the
/// item, injects the item into the shared context, invokes the action and
/// restores the context. Domain failures stop the run immediately unless
/// `fail_at_end` is set, in which case they are collected and reported after
/// the last item.
#[derive(Debug, Clone)]
pub struct IterationEngine {
	pattern: PlaceholderPattern,
	items: ItemsConfig,
	root: PathBuf,
	actions: Vec<ActionDefinition>,
	defaults: ActionDefaults,
	fail_at_end: bool,
	skip: bool,
}

impl IterationEngine {
	/// Create an engine without items. Relative folders are resolved against
	/// the current directory until [`IterationEngine::with_root`] is used.
	pub fn new(pattern: PlaceholderPattern, actions: Vec<ActionDefinition>) -> Self {
		Self {
			pattern,
			items: ItemsConfig::default(),
			root: PathBuf::from("."),
			actions,
			defaults: ActionDefaults::new(),
			fail_at_end: false,
			skip: false,
		}
	}

	/// Build the engine described by `config`. `root` is the project root that
	/// relative folders are resolved against.
	pub fn from_config(config: &ItexConfig, root: &Path) -> ItexResult<Self> {
		Ok(Self::new(config.placeholder_pattern()?, config.action_definitions()?)
			.with_items(config.items.clone())
			.with_defaults(config.action_defaults()?)
			.with_root(root)
			.fail_at_end(config.fail_at_end)
			.skip(config.skip))
	}

	#[must_use]
	pub fn with_items(mut self, items: ItemsConfig) -> Self {
		self.items = items;
		self
	}

	#[must_use]
	pub fn with_defaults(mut self, defaults: ActionDefaults) -> Self {
		self.defaults = defaults;
		self
	}

	#[must_use]
	pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.root = root.into();
		self
	}

	#[must_use]
	pub fn fail_at_end(mut self, fail_at_end: bool) -> Self {
		self.fail_at_end = fail_at_end;
		self
	}

	#[must_use]
	pub fn skip(mut self, skip: bool) -> Self {
		self.skip = skip;
		self
	}

	pub fn pattern(&self) -> &PlaceholderPattern {
		&self.pattern
	}

	pub fn actions(&self) -> &[ActionDefinition] {
		&self.actions
	}

	/// Resolve the configured items without running anything. `None` means no
	/// item source is configured.
	pub fn items(&self) -> ItexResult<Option<Vec<Item>>> {
		resolve_items(&self.items, &self.root)
	}

	/// Run the pipeline for every item.
	///
	/// `context` must not be shared with anything else for the duration of
	/// the run. It is returned to its prior state after every invocation.
	pub fn run(
		&self,
		context: &mut SharedContext,
		invoker: &mut dyn ActionInvoker,
	) -> ItexResult<RunSummary> {
		if self.skip {
			info!("{SKIP_MESSAGE}");
			return Ok(RunSummary {
				skipped: true,
				..RunSummary::default()
			});
		}

		let Some(items) = self.items()? else {
			info!("{NOTHING_CONFIGURED_MESSAGE}");
			return Ok(RunSummary::default());
		};

		if self.actions.is_empty() {
			warn!("no actions configured, {} item(s) resolved", items.len());
		}

		debug!(items = items.len(), actions = self.actions.len(), "start iteration");

		let mut failures: Vec<IterationFailure> = Vec::new();
		let mut invocations = 0;

		for item in &items {
			for action in &self.actions {
				let outcome = match self.invoke(item, action, context, invoker) {
					Ok(outcome) => outcome,
					Err(e) => {
						log_failures(&failures);
						return Err(e);
					}
				};
				invocations += 1;

				let Some(failure) = outcome else {
					continue;
				};

				if !self.fail_at_end {
					return Err(ItexError::ActionFailed {
						item: failure.item,
						action: failure.action,
						message: failure.message,
					});
				}

				failures.push(failure);
			}
		}

		if !failures.is_empty() {
			log_failures(&failures);
			return Err(ItexError::IterationFailures { failures });
		}

		Ok(RunSummary {
			skipped: false,
			items: items.len(),
			invocations,
		})
	}

	/// Run one action for one item. Returns the domain failure, if any.
	fn invoke(
		&self,
		item: &Item,
		action: &ActionDefinition,
		context: &mut SharedContext,
		invoker: &mut dyn ActionInvoker,
	) -> ItexResult<Option<IterationFailure>> {
		let version = resolve_version(action, &self.defaults)?;

		let merged = merged_configuration(action, &self.defaults);
		debug!(action = %action.id, configuration = %merged, "merged configuration");

		let configuration = merged.resolve(&self.pattern, &item.name);
		debug!(action = %action.id, configuration = %configuration, "resolved configuration");

		let request = InvocationRequest {
			id: &action.id,
			version,
			goal: &action.goal,
			configuration: &configuration,
			item,
		};
		info!("------ ({}) {request}", item.name);

		let entries = iter::once((self.pattern.name(), item.name.as_str())).chain(
			item.properties
				.iter()
				.map(|(key, value)| (key.as_str(), value.as_str())),
		);

		let result = {
			let overlay = ContextOverlay::inject(context, entries);
			invoker.invoke(&request, &overlay)
		};

		match result {
			Ok(ActionOutcome::Success) => Ok(None),
			Ok(ActionOutcome::Failure(message)) => {
				Ok(Some(IterationFailure {
					item: item.name.clone(),
					action: request.to_string(),
					message,
				}))
			}
			Err(source) => {
				Err(ItexError::Invocation {
					item: item.name.clone(),
					action: request.to_string(),
					source,
				})
			}
		}
	}
}

fn log_failures(failures: &[IterationFailure]) {
	for failure in failures {
		error!("{failure}");
	}
}

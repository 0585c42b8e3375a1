use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;

use crate::ItexError;
use crate::ItexResult;
use crate::action::ActionDefault;
use crate::action::ActionDefaults;
use crate::action::ActionDefinition;
use crate::action::ActionId;
use crate::item::Item;
use crate::node::CONFIGURATION_NODE;
use crate::node::ConfigNode;
use crate::node::scalar_to_string;
use crate::placeholder::PlaceholderPattern;
use crate::scanner::SortOrder;

/// Default begin and end token of every placeholder.
pub const DEFAULT_TOKEN: &str = "@";
/// Default name of the iterator variable.
pub const DEFAULT_ITERATOR_NAME: &str = "item";
/// Default delimiter for `items.content`.
pub const DEFAULT_DELIMITER: &str = ",";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["itex.toml", ".itex.toml", ".config/itex.toml"];

/// Configuration loaded from an `itex.toml` file.
///
/// ```toml
/// fail_at_end = true
///
/// [items]
/// list = ["one", "two"]
///
/// [properties]
/// greeting = "hello"
///
/// [defaults."itex:exec"]
/// version = "1"
///
/// [[actions]]
/// id = "itex:exec"
/// goal = "shell"
/// configuration = { command = "echo $greeting @item@" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItexConfig {
	/// Bypass the whole run.
	pub skip: bool,
	/// Collect domain failures and report them after every item has been
	/// processed instead of stopping at the first one.
	pub fail_at_end: bool,
	pub begin_token: String,
	pub end_token: String,
	pub iterator_name: String,
	pub items: ItemsConfig,
	/// Initial contents of the shared context store.
	#[serde(deserialize_with = "deserialize_scalar_map")]
	pub properties: IndexMap<String, String>,
	/// Default version and base configuration per action id.
	pub defaults: IndexMap<String, ActionDefaultConfig>,
	/// The per-item pipeline, run in order.
	pub actions: Vec<ActionConfig>,
}

impl Default for ItexConfig {
	fn default() -> Self {
		Self {
			skip: false,
			fail_at_end: false,
			begin_token: DEFAULT_TOKEN.to_string(),
			end_token: DEFAULT_TOKEN.to_string(),
			iterator_name: DEFAULT_ITERATOR_NAME.to_string(),
			items: ItemsConfig::default(),
			properties: IndexMap::new(),
			defaults: IndexMap::new(),
			actions: Vec::new(),
		}
	}
}

/// The `[items]` section. At most one of its sources may be set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
	pub list: Option<Vec<String>>,
	pub with_properties: Option<Vec<Item>>,
	pub content: Option<String>,
	/// Literal delimiter used to split `content`.
	pub delimiter: String,
	pub folder: Option<FolderConfig>,
}

impl Default for ItemsConfig {
	fn default() -> Self {
		Self {
			list: None,
			with_properties: None,
			content: None,
			delimiter: DEFAULT_DELIMITER.to_string(),
			folder: None,
		}
	}
}

/// The `[items.folder]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
	/// Folder to scan, relative to the project root unless absolute.
	pub path: PathBuf,
	pub includes: Vec<String>,
	pub excludes: Vec<String>,
	/// Maximum scan depth, negative for unbounded. Ignored (treated as `1`)
	/// when neither includes nor excludes are given.
	pub depth: i64,
	pub include_files: bool,
	pub full_path: bool,
	pub sort_order: SortOrder,
}

impl Default for FolderConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from("."),
			includes: Vec::new(),
			excludes: Vec::new(),
			depth: -1,
			include_files: false,
			full_path: false,
			sort_order: SortOrder::default(),
		}
	}
}

/// An entry of the `[defaults]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActionDefaultConfig {
	pub version: Option<String>,
	pub configuration: Option<toml::Table>,
}

/// An entry of the `[[actions]]` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionConfig {
	/// Action identity, `<namespace>:<name>`.
	pub id: String,
	#[serde(default)]
	pub version: Option<String>,
	pub goal: String,
	#[serde(default)]
	pub configuration: Option<toml::Table>,
}

impl ItexConfig {
	/// Returns the first config file found at `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> ItexResult<Option<ItexConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit file.
	pub fn load_from(path: &Path) -> ItexResult<ItexConfig> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	pub fn from_toml_str(content: &str) -> ItexResult<ItexConfig> {
		toml::from_str(content).map_err(|e| ItexError::ConfigParse(e.to_string()))
	}

	/// The placeholder syntax described by `begin_token`, `iterator_name` and
	/// `end_token`.
	pub fn placeholder_pattern(&self) -> ItexResult<PlaceholderPattern> {
		PlaceholderPattern::new(&self.begin_token, &self.iterator_name, &self.end_token)
	}

	/// Parse the `[[actions]]` entries, keeping their order.
	pub fn action_definitions(&self) -> ItexResult<Vec<ActionDefinition>> {
		self.actions
			.iter()
			.map(|action| -> ItexResult<ActionDefinition> {
				let mut definition = ActionDefinition::new(action.id.parse()?, &action.goal);
				definition.version.clone_from(&action.version);
				definition.configuration = action
					.configuration
					.as_ref()
					.map(|table| ConfigNode::from_toml_table(CONFIGURATION_NODE, table))
					.transpose()?;
				Ok(definition)
			})
			.collect()
	}

	/// Parse the `[defaults]` table.
	pub fn action_defaults(&self) -> ItexResult<ActionDefaults> {
		let mut defaults = ActionDefaults::new();
		for (id, entry) in &self.defaults {
			let id: ActionId = id.parse()?;
			let configuration = entry
				.configuration
				.as_ref()
				.map(|table| ConfigNode::from_toml_table(CONFIGURATION_NODE, table))
				.transpose()?;
			defaults.insert(
				id,
				ActionDefault {
					version: entry.version.clone(),
					configuration,
				},
			);
		}

		Ok(defaults)
	}
}

/// Deserialize a table of scalars into strings, so that
/// `{ port = 8080, debug = true }` yields `"8080"` and `"true"`.
pub fn deserialize_scalar_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = IndexMap::<String, toml::Value>::deserialize(deserializer)?;
	raw.into_iter()
		.map(|(key, value)| {
			match scalar_to_string(&value) {
				Some(text) => Ok((key, text)),
				None => {
					Err(serde::de::Error::custom(format!(
						"property `{key}` must be a string, number or boolean"
					)))
				}
			}
		})
		.collect()
}

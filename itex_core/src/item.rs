use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::ItexError;
use crate::ItexResult;
use crate::config::ItemsConfig;
use crate::config::deserialize_scalar_map;
use crate::scanner::DirectoryScanner;
use crate::scanner::ScanConfig;

/// One unit of iteration: a name and optional supplemental properties that are
/// made available in the shared context while the item is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
	pub name: String,
	#[serde(default, deserialize_with = "deserialize_scalar_map")]
	pub properties: IndexMap<String, String>,
}

impl Item {
	/// Create an item without properties.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			properties: IndexMap::new(),
		}
	}

	/// Create an item carrying the given properties.
	pub fn with_properties<K, V>(
		name: impl Into<String>,
		properties: impl IntoIterator<Item = (K, V)>,
	) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			name: name.into(),
			properties: properties
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		}
	}

	pub fn has_properties(&self) -> bool {
		!self.properties.is_empty()
	}
}

/// The single active source of items.
///
/// Exactly one source may be configured. [`ItemSource::select`] returns
/// `Ok(None)` when none is configured and an error when more than one is.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ItemSource {
	/// Items with supplemental properties, passed through verbatim.
	WithProperties(Vec<Item>),
	/// A delimited string split into trimmed item names.
	Content { content: String, delimiter: String },
	/// An explicit list of item names.
	List(Vec<String>),
	/// Entries discovered by scanning a folder tree.
	Folder(ScanConfig),
}

impl ItemSource {
	/// Pick the configured item source.
	///
	/// Every source is inspected independently so that any combination of two
	/// or more configured sources is rejected.
	pub fn select(items: &ItemsConfig, root: &Path) -> ItexResult<Option<Self>> {
		let configured: Vec<&'static str> = [
			("items.with_properties", is_set(items.with_properties.as_deref())),
			("items.content", is_content_set(items.content.as_deref())),
			("items.list", is_set(items.list.as_deref())),
			("items.folder", items.folder.is_some()),
		]
		.into_iter()
		.filter_map(|(name, set)| set.then_some(name))
		.collect();

		if configured.len() > 1 {
			return Err(ItexError::MultipleItemSources {
				sources: configured,
			});
		}

		if let Some(with_properties) = items.with_properties.as_ref().filter(|v| !v.is_empty()) {
			return Ok(Some(Self::WithProperties(with_properties.clone())));
		}

		if let Some(content) = items.content.as_ref().filter(|c| !c.trim().is_empty()) {
			return Ok(Some(Self::Content {
				content: content.clone(),
				delimiter: items.delimiter.clone(),
			}));
		}

		if let Some(list) = items.list.as_ref().filter(|v| !v.is_empty()) {
			return Ok(Some(Self::List(list.clone())));
		}

		if let Some(folder) = &items.folder {
			return Ok(Some(Self::Folder(ScanConfig::from_folder_config(
				root, folder,
			))));
		}

		Ok(None)
	}

	/// Turn the source into its ordered list of items.
	pub fn resolve(self) -> ItexResult<Vec<Item>> {
		match self {
			Self::WithProperties(items) => Ok(items),
			Self::Content { content, delimiter } => {
				Ok(split_content(&content, &delimiter)?
					.into_iter()
					.map(Item::new)
					.collect())
			}
			Self::List(names) => Ok(names.into_iter().map(Item::new).collect()),
			Self::Folder(scan) => {
				let scanner = DirectoryScanner::new(scan)?;
				Ok(scanner
					.scan()?
					.into_iter()
					.map(|path| Item::new(path.to_string_lossy()))
					.collect())
			}
		}
	}

	/// Short name of the source, used in log output.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::WithProperties(_) => "with_properties",
			Self::Content { .. } => "content",
			Self::List(_) => "list",
			Self::Folder(_) => "folder",
		}
	}
}

/// Resolve the configured items. Returns `None` when no item source is
/// configured at all.
pub fn resolve_items(items: &ItemsConfig, root: &Path) -> ItexResult<Option<Vec<Item>>> {
	match ItemSource::select(items, root)? {
		Some(source) => source.resolve().map(Some),
		None => Ok(None),
	}
}

/// Split `content` on the literal `delimiter` and trim every fragment.
/// Trailing empty fragments are dropped, so `"a, b,"` yields `["a", "b"]`.
pub fn split_content(content: &str, delimiter: &str) -> ItexResult<Vec<String>> {
	if delimiter.is_empty() {
		return Err(ItexError::InvalidConfig {
			field: "items.delimiter".to_string(),
			reason: "the delimiter must not be empty".to_string(),
		});
	}

	let mut names: Vec<String> = content
		.split(delimiter)
		.map(|fragment| fragment.trim().to_string())
		.collect();

	while names.last().is_some_and(String::is_empty) {
		names.pop();
	}

	Ok(names)
}

fn is_set<T>(values: Option<&[T]>) -> bool {
	values.is_some_and(|values| !values.is_empty())
}

fn is_content_set(content: Option<&str>) -> bool {
	content.is_some_and(|content| !content.trim().is_empty())
}

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::ItexError;
use crate::ItexResult;
use crate::placeholder::PlaceholderPattern;

/// Name of the root node of every action configuration.
pub const CONFIGURATION_NODE: &str = "configuration";
/// Name given to the children created for TOML array elements.
pub const ARRAY_ENTRY_NODE: &str = "entry";
/// TOML keys starting with this prefix become attributes.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Attribute controlling how a dominant node's children are merged.
pub const COMBINE_CHILDREN: &str = "combine.children";
/// Attribute controlling whether a dominant node is merged at all.
pub const COMBINE_SELF: &str = "combine.self";

/// A node of a hierarchical action configuration.
///
/// Each node owns its children; a tree never shares nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigNode {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
	#[serde(skip_serializing_if = "IndexMap::is_empty")]
	pub attributes: IndexMap<String, String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<ConfigNode>,
}

impl ConfigNode {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// An empty `configuration` root node.
	pub fn configuration() -> Self {
		Self::new(CONFIGURATION_NODE)
	}

	#[must_use]
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	#[must_use]
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn with_child(mut self, child: ConfigNode) -> Self {
		self.children.push(child);
		self
	}

	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}

	/// The first child called `name`.
	pub fn child(&self, name: &str) -> Option<&ConfigNode> {
		self.children.iter().find(|child| child.name == name)
	}

	pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> {
		self.children.iter().filter(move |child| child.name == name)
	}

	/// The value of the first child called `name`.
	pub fn child_value(&self, name: &str) -> Option<&str> {
		self.child(name).and_then(ConfigNode::value)
	}

	/// Deep copy of this tree with every value and attribute value passed
	/// through `pattern` for the current item `value`.
	///
	/// Absent values stay absent. The source tree is left untouched so the
	/// same template can be resolved again for the next item.
	#[must_use]
	pub fn resolve(&self, pattern: &PlaceholderPattern, value: &str) -> ConfigNode {
		ConfigNode {
			name: self.name.clone(),
			value: self
				.value
				.as_deref()
				.map(|template| pattern.substitute(template, value)),
			attributes: self
				.attributes
				.iter()
				.map(|(name, template)| (name.clone(), pattern.substitute(template, value)))
				.collect(),
			children: self
				.children
				.iter()
				.map(|child| child.resolve(pattern, value))
				.collect(),
		}
	}

	/// Merge `recessive` into `dominant`, the dominant side winning every
	/// conflict.
	///
	/// - A dominant value wins when present, otherwise the recessive value is
	///   taken.
	/// - Recessive attributes fill in attributes the dominant node lacks.
	/// - Children are paired by name and occurrence and merged recursively;
	///   recessive children without a partner are appended.
	/// - `combine.children="append"` on the dominant node appends all recessive
	///   children unpaired, `combine.self="override"` skips merging entirely.
	#[must_use]
	pub fn merge(dominant: &ConfigNode, recessive: &ConfigNode) -> ConfigNode {
		if dominant.attribute(COMBINE_SELF) == Some("override") {
			return dominant.clone();
		}

		let mut merged = dominant.clone();
		if merged.value.is_none() {
			merged.value.clone_from(&recessive.value);
		}

		for (name, value) in &recessive.attributes {
			if !merged.attributes.contains_key(name) {
				merged.attributes.insert(name.clone(), value.clone());
			}
		}

		if dominant.attribute(COMBINE_CHILDREN) == Some("append") {
			merged.children.extend(recessive.children.iter().cloned());
			return merged;
		}

		let mut seen: IndexMap<&str, usize> = IndexMap::new();
		for child in &recessive.children {
			let occurrence = seen.entry(child.name.as_str()).or_insert(0);
			let partner = merged
				.children
				.iter_mut()
				.filter(|candidate| candidate.name == child.name)
				.nth(*occurrence);
			*occurrence += 1;

			match partner {
				Some(partner) => *partner = ConfigNode::merge(partner, child),
				None => merged.children.push(child.clone()),
			}
		}

		merged
	}

	/// Build a node from a TOML table.
	///
	/// Scalars become values (numbers, booleans and dates in their TOML text
	/// form), nested tables become children, arrays become a node with one
	/// `entry` child per element and keys prefixed with `@` become attributes.
	pub fn from_toml_table(name: impl Into<String>, table: &toml::Table) -> ItexResult<ConfigNode> {
		let mut node = ConfigNode::new(name);

		for (key, value) in table {
			if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
				let Some(text) = scalar_to_string(value) else {
					return Err(ItexError::InvalidConfig {
						field: key.clone(),
						reason: "attributes must be strings, numbers or booleans".to_string(),
					});
				};
				node.attributes.insert(attribute.to_string(), text);
				continue;
			}

			node.children.push(ConfigNode::from_toml_value(key.clone(), value)?);
		}

		Ok(node)
	}

	fn from_toml_value(name: String, value: &toml::Value) -> ItexResult<ConfigNode> {
		match value {
			toml::Value::Table(table) => ConfigNode::from_toml_table(name, table),
			toml::Value::Array(values) => {
				let mut node = ConfigNode::new(name);
				for value in values {
					node.children.push(ConfigNode::from_toml_value(
						ARRAY_ENTRY_NODE.to_string(),
						value,
					)?);
				}
				Ok(node)
			}
			scalar => {
				let mut node = ConfigNode::new(name);
				node.value = scalar_to_string(scalar);
				Ok(node)
			}
		}
	}
}

/// Text form of a TOML scalar, `None` for arrays and tables.
pub(crate) fn scalar_to_string(value: &toml::Value) -> Option<String> {
	match value {
		toml::Value::String(s) => Some(s.clone()),
		toml::Value::Integer(i) => Some(i.to_string()),
		toml::Value::Float(f) => Some(f.to_string()),
		toml::Value::Boolean(b) => Some(b.to_string()),
		toml::Value::Datetime(dt) => Some(dt.to_string()),
		toml::Value::Array(_) | toml::Value::Table(_) => None,
	}
}

/// Renders the tree as compact XML, e.g.
/// `<configuration><command>echo one</command></configuration>`.
impl fmt::Display for ConfigNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<{}", self.name)?;
		for (name, value) in &self.attributes {
			write!(f, " {name}=\"{}\"", escape_xml(value))?;
		}

		if self.value.is_none() && self.children.is_empty() {
			return write!(f, "/>");
		}

		write!(f, ">")?;
		if let Some(value) = &self.value {
			write!(f, "{}", escape_xml(value))?;
		}
		for child in &self.children {
			write!(f, "{child}")?;
		}
		write!(f, "</{}>", self.name)
	}
}

fn escape_xml(value: &str) -> String {
	value
		.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
}

use crate::ItexError;
use crate::ItexResult;

/// A derived view of the current item's value.
///
/// Every resolver is purely textual. Values are treated as paths using either
/// `/` or `\` as separator, the file system is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Resolver {
	/// `@item@`: the value unchanged.
	Identity,
	/// `@item.folder@`: the value without its final segment.
	Folder,
	/// `@item.foldername@`: the last segment of `folder`.
	FolderName,
	/// `@item.parentfolder@`: `folder` applied twice.
	ParentFolder,
	/// `@item.parentfoldername@`: the last segment of `parentfolder`.
	ParentFolderName,
	/// `@item.filename@`: the final segment, extension included.
	FileName,
	/// `@item.extension@`: text after the last `.` of the final segment.
	Extension,
	/// `@item.basename@`: the final segment without its extension.
	BaseName,
}

impl Resolver {
	pub const ALL: [Self; 8] = [
		Self::Identity,
		Self::Folder,
		Self::FolderName,
		Self::ParentFolder,
		Self::ParentFolderName,
		Self::FileName,
		Self::Extension,
		Self::BaseName,
	];

	/// The suffix appended to the iterator name, including the leading `.`.
	/// The identity resolver has an empty suffix.
	pub fn suffix(self) -> &'static str {
		match self {
			Self::Identity => "",
			Self::Folder => ".folder",
			Self::FolderName => ".foldername",
			Self::ParentFolder => ".parentfolder",
			Self::ParentFolderName => ".parentfoldername",
			Self::FileName => ".filename",
			Self::Extension => ".extension",
			Self::BaseName => ".basename",
		}
	}

	pub fn from_suffix(suffix: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|resolver| resolver.suffix() == suffix)
	}

	pub fn apply(self, value: &str) -> String {
		match self {
			Self::Identity => value.to_string(),
			Self::Folder => folder(value).to_string(),
			Self::FolderName => file_name(folder(value)).to_string(),
			Self::ParentFolder => folder(folder(value)).to_string(),
			Self::ParentFolderName => file_name(folder(folder(value))).to_string(),
			Self::FileName => file_name(value).to_string(),
			Self::Extension => extension(value).to_string(),
			Self::BaseName => base_name(value).to_string(),
		}
	}
}

fn last_separator(value: &str) -> Option<usize> {
	value.rfind(['/', '\\'])
}

/// Everything before the last separator, or `""` without one.
pub fn folder(value: &str) -> &str {
	last_separator(value).map_or("", |index| &value[..index])
}

/// Everything after the last separator.
pub fn file_name(value: &str) -> &str {
	last_separator(value).map_or(value, |index| &value[index + 1..])
}

pub fn extension(value: &str) -> &str {
	let name = file_name(value);
	name.rfind('.').map_or("", |index| &name[index + 1..])
}

/// The file name with its extension and separating dot removed. A name
/// without extension (including one ending in a bare `.`) is kept as is.
pub fn base_name(value: &str) -> &str {
	let name = file_name(value);
	match name.rfind('.') {
		Some(index) if index + 1 < name.len() => &name[..index],
		_ => name,
	}
}

/// The placeholder syntax for one iterator variable: `begin + name + suffix +
/// end` for every [`Resolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderPattern {
	begin_token: String,
	end_token: String,
	name: String,
	/// Placeholders with their resolvers, longest placeholder first.
	placeholders: Vec<(String, Resolver)>,
}

impl PlaceholderPattern {
	pub fn new(
		begin_token: impl Into<String>,
		name: impl Into<String>,
		end_token: impl Into<String>,
	) -> ItexResult<Self> {
		let begin_token = begin_token.into();
		let end_token = end_token.into();
		let name = name.into();

		if name.is_empty() {
			return Err(ItexError::InvalidPlaceholder(
				"the iterator name is empty".to_string(),
			));
		}

		let placeholders = build_placeholders(&begin_token, &name, &end_token);

		Ok(Self {
			begin_token,
			end_token,
			name,
			placeholders,
		})
	}

	pub fn begin_token(&self) -> &str {
		&self.begin_token
	}

	pub fn end_token(&self) -> &str {
		&self.end_token
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// The textual placeholder for `resolver`, e.g. `@item.extension@`.
	pub fn placeholder(&self, resolver: Resolver) -> String {
		format!(
			"{}{}{}{}",
			self.begin_token,
			self.name,
			resolver.suffix(),
			self.end_token
		)
	}

	/// Replace every placeholder form in `template` with the matching derived
	/// view of `value`.
	pub fn substitute(&self, template: &str, value: &str) -> String {
		self.substitute_with(template, value, &Resolver::ALL)
	}

	/// Replace only the placeholders of the given resolvers.
	///
	/// The template is scanned once from left to right and matched literally.
	/// Substituted text is never scanned again, so an item value that itself
	/// looks like a placeholder is inserted verbatim.
	pub fn substitute_with(&self, template: &str, value: &str, resolvers: &[Resolver]) -> String {
		let prefix = format!("{}{}", self.begin_token, self.name);
		let mut result = String::with_capacity(template.len());
		let mut rest = template;

		while let Some(start) = rest.find(prefix.as_str()) {
			result.push_str(&rest[..start]);
			rest = &rest[start..];

			let matched = self
				.placeholders
				.iter()
				.filter(|(_, resolver)| resolvers.contains(resolver))
				.find(|(placeholder, _)| rest.starts_with(placeholder.as_str()));

			if let Some((placeholder, resolver)) = matched {
				result.push_str(&resolver.apply(value));
				rest = &rest[placeholder.len()..];
			} else {
				let Some(first) = rest.chars().next() else {
					break;
				};
				result.push(first);
				rest = &rest[first.len_utf8()..];
			}
		}

		result.push_str(rest);
		result
	}

	/// Returns true if `template` contains any placeholder of this pattern.
	pub fn is_present_in(&self, template: &str) -> bool {
		self.placeholders
			.iter()
			.any(|(placeholder, _)| template.contains(placeholder.as_str()))
	}
}

impl Default for PlaceholderPattern {
	fn default() -> Self {
		let token = crate::config::DEFAULT_TOKEN;
		let name = crate::config::DEFAULT_ITERATOR_NAME;

		Self {
			begin_token: token.to_string(),
			end_token: token.to_string(),
			name: name.to_string(),
			placeholders: build_placeholders(token, name, token),
		}
	}
}

fn build_placeholders(begin_token: &str, name: &str, end_token: &str) -> Vec<(String, Resolver)> {
	let mut placeholders: Vec<(String, Resolver)> = Resolver::ALL
		.into_iter()
		.map(|resolver| {
			(
				format!("{begin_token}{name}{}{end_token}", resolver.suffix()),
				resolver,
			)
		})
		.collect();
	// With an empty end token `@item.folder` is a prefix of
	// `@item.foldername`, so the longer form has to be tried first.
	placeholders.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
	placeholders
}

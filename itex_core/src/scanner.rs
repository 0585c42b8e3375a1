use std::cmp::Ordering;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;
use indexmap::IndexSet;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::ItexError;
use crate::ItexResult;
use crate::config::FolderConfig;

/// Order in which scanned entries are returned. Sorting only looks at the
/// final path segment's name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SortOrder {
	/// Case-sensitive ascending.
	#[default]
	Name,
	/// Case-insensitive ascending.
	NameCi,
	/// Case-sensitive descending.
	NameRev,
	/// Case-insensitive descending.
	NameCiRev,
	/// Ascending, case-sensitive unless the platform's file system is not
	/// (Windows).
	System,
	/// Descending variant of [`SortOrder::System`].
	SystemRev,
}

impl SortOrder {
	/// Compare two paths by their final segment.
	pub fn compare(self, a: &Path, b: &Path) -> Ordering {
		let a = file_name_of(a);
		let b = file_name_of(b);
		let system_insensitive = cfg!(windows);

		match self {
			Self::Name => a.cmp(&b),
			Self::NameCi => compare_insensitive(&a, &b),
			Self::NameRev => b.cmp(&a),
			Self::NameCiRev => compare_insensitive(&b, &a),
			Self::System if system_insensitive => compare_insensitive(&a, &b),
			Self::System => a.cmp(&b),
			Self::SystemRev if system_insensitive => compare_insensitive(&b, &a),
			Self::SystemRev => b.cmp(&a),
		}
	}
}

impl FromStr for SortOrder {
	type Err = ItexError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let order = match value.to_ascii_uppercase().as_str() {
			"NAME" | "NAME_COMPARATOR" => Self::Name,
			"NAME_CI" | "NAME_INSENSITIVE_COMPARATOR" => Self::NameCi,
			"NAME_REV" | "NAME_REVERSE" => Self::NameRev,
			"NAME_CI_REV" | "NAME_INSENSITIVE_REVERSE" => Self::NameCiRev,
			"SYSTEM" | "NAME_SYSTEM_COMPARATOR" => Self::System,
			"SYSTEM_REV" | "NAME_SYSTEM_REVERSE" => Self::SystemRev,
			_ => {
				return Err(ItexError::InvalidConfig {
					field: "items.folder.sort_order".to_string(),
					reason: format!(
						"unknown sort order `{value}` (expected one of name, name_ci, name_rev, \
						 name_ci_rev, system, system_rev)"
					),
				});
			}
		};

		Ok(order)
	}
}

impl<'de> Deserialize<'de> for SortOrder {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = String::deserialize(deserializer)?;
		value.parse().map_err(serde::de::Error::custom)
	}
}

fn file_name_of(path: &Path) -> String {
	path.file_name()
		.map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
		.into_owned()
}

fn compare_insensitive(a: &str, b: &str) -> Ordering {
	a.to_lowercase().cmp(&b.to_lowercase())
}

/// Everything needed to scan a folder tree for items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
	/// Directory to scan. Never part of the results itself.
	pub base_dir: PathBuf,
	/// Glob patterns an entry must match (any of). Empty means everything.
	pub includes: Vec<String>,
	/// Glob patterns an entry must not match.
	pub excludes: Vec<String>,
	/// Maximum depth below `base_dir`; negative means unbounded.
	pub depth: i64,
	/// Whether plain files are returned in addition to directories.
	pub include_files: bool,
	/// Return absolute, normalized paths instead of paths relative to
	/// `base_dir`.
	pub full_path: bool,
	pub sort_order: SortOrder,
}

impl ScanConfig {
	/// Scan `base_dir` without filters, which only visits its direct children
	/// (see [`ScanConfig::effective_depth`]).
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self {
			base_dir: base_dir.into(),
			includes: Vec::new(),
			excludes: Vec::new(),
			depth: -1,
			include_files: false,
			full_path: false,
			sort_order: SortOrder::default(),
		}
	}

	/// Build from the `[items.folder]` section, resolving a relative folder
	/// against `root`.
	pub fn from_folder_config(root: &Path, folder: &FolderConfig) -> Self {
		let base_dir = if folder.path.is_absolute() {
			folder.path.clone()
		} else {
			root.join(&folder.path)
		};

		Self {
			base_dir,
			includes: folder.includes.clone(),
			excludes: folder.excludes.clone(),
			depth: folder.depth,
			include_files: folder.include_files,
			full_path: folder.full_path,
			sort_order: folder.sort_order,
		}
	}

	/// The depth the walk actually uses. Without any include or exclude
	/// filter only the direct children of `base_dir` are visited.
	pub fn effective_depth(&self) -> Option<usize> {
		if self.includes.is_empty() && self.excludes.is_empty() {
			return Some(1);
		}

		usize::try_from(self.depth).ok()
	}
}

/// Compiled include and exclude glob patterns.
///
/// A path is kept when it matches at least one include pattern (or no include
/// patterns exist) and matches no exclude pattern.
#[derive(Debug, Clone)]
pub struct GlobFilterSet {
	includes: GlobSet,
	excludes: GlobSet,
}

impl GlobFilterSet {
	pub fn new(includes: &[String], excludes: &[String]) -> ItexResult<Self> {
		Ok(Self {
			includes: build_glob_set(includes)?,
			excludes: build_glob_set(excludes)?,
		})
	}

	/// A filter set that keeps everything.
	pub fn empty() -> Self {
		Self {
			includes: GlobSet::empty(),
			excludes: GlobSet::empty(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.includes.is_empty() && self.excludes.is_empty()
	}

	pub fn keep(&self, path: &Path) -> bool {
		(self.includes.is_empty() || self.includes.is_match(path)) && !self.excludes.is_match(path)
	}
}

/// Compile glob patterns. `*` and `?` never cross a path separator while `**`
/// spans any number of directories, including none.
fn build_glob_set(patterns: &[String]) -> ItexResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = GlobBuilder::new(pattern)
			.literal_separator(true)
			.build()
			.map_err(|e| {
				ItexError::InvalidGlob {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;
		builder.add(glob);
	}

	builder.build().map_err(|e| {
		ItexError::InvalidGlob {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Walks a folder tree and returns the entries selected by a [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
	config: ScanConfig,
	filter: GlobFilterSet,
}

impl DirectoryScanner {
	/// Compile the filters of `config`. The compiled matchers are reused for
	/// every scan made with this scanner.
	pub fn new(config: ScanConfig) -> ItexResult<Self> {
		let filter = GlobFilterSet::new(&config.includes, &config.excludes)?;
		Ok(Self { config, filter })
	}

	pub fn config(&self) -> &ScanConfig {
		&self.config
	}

	/// Scan the tree. Glob patterns are matched against each entry's path
	/// relative to the base directory, using `/` as separator.
	///
	/// An unreadable base directory or any I/O error during the walk fails the
	/// whole scan.
	pub fn scan(&self) -> ItexResult<Vec<PathBuf>> {
		let base_dir = &self.config.base_dir;
		if !base_dir.is_dir() || std::fs::read_dir(base_dir).is_err() {
			return Err(ItexError::ScanRoot {
				path: base_dir.display().to_string(),
			});
		}

		let absolute_base = normalize_path(&std::path::absolute(base_dir)?);
		let mut found: IndexSet<PathBuf> = IndexSet::new();

		let walker = WalkBuilder::new(base_dir)
			.standard_filters(false)
			.follow_links(false)
			.max_depth(self.config.effective_depth())
			.sort_by_file_name(|a, b| a.cmp(b))
			.build();

		for entry in walker {
			let entry = entry.map_err(|e| {
				ItexError::Scan {
					path: base_dir.display().to_string(),
					reason: e.to_string(),
				}
			})?;

			if entry.depth() == 0 {
				continue;
			}

			let Ok(relative) = entry.path().strip_prefix(base_dir) else {
				continue;
			};

			if !self.filter.keep(relative) {
				continue;
			}

			if !self.config.include_files && !entry.path().is_dir() {
				continue;
			}

			found.insert(relative.to_path_buf());
		}

		let mut paths: Vec<PathBuf> = found.into_iter().collect();
		let order = self.config.sort_order;
		paths.sort_by(|a, b| order.compare(a, b));

		if self.config.full_path {
			return Ok(paths
				.into_iter()
				.map(|relative| normalize_path(&absolute_base.join(relative)))
				.collect());
		}

		Ok(paths)
	}
}

/// Scan `base_dir` with the given filters and depth, returning relative paths
/// of the directories found in name order.
pub fn scan_directories(
	base_dir: &Path,
	includes: &[String],
	excludes: &[String],
	depth: i64,
) -> ItexResult<Vec<PathBuf>> {
	let config = ScanConfig {
		includes: includes.to_vec(),
		excludes: excludes.to_vec(),
		depth,
		..ScanConfig::new(base_dir)
	};
	DirectoryScanner::new(config)?.scan()
}

/// Lexically remove `.` segments and resolve `..` segments.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !normalized.pop() {
					normalized.push(component);
				}
			}
			other => normalized.push(other),
		}
	}
	normalized
}

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Run a pipeline of actions once for every item of a list or a scanned folder tree.",
	long_about = "itex runs the actions configured in `itex.toml` once per item. Items come from \
	              an explicit list, a delimited string, a list of items carrying their own \
	              properties, or the folders and files found by scanning a directory \
	              tree.\n\nPlaceholders such as `@item@`, `@item.basename@` or \
	              `@item.parentfolder@` are replaced in every action's configuration before it \
	              runs.\n\nQuick start:\n  itex init  Create a sample itex.toml\n  itex list  \
	              Show the items that would be processed\n  itex run   Run every action for \
	              every item"
)]
pub struct ItexCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Path to the config file. Defaults to the first of `itex.toml`,
	/// `.itex.toml` or `.config/itex.toml` found in the project root.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize itex in a project by creating a sample config file.
	///
	/// Creates an `itex.toml` file in the project root with a commented example
	/// of every item source and a single shell action. If a config file already
	/// exists, this command is a no-op and exits successfully.
	Init,
	/// Run every configured action once for every item.
	///
	/// Exits with status 1 when an action reports failure and with status 2
	/// when the configuration is invalid or an action cannot be invoked.
	Run {
		/// Print each resolved action configuration instead of running it.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Skip the run entirely, overriding `skip` in the config file.
		#[arg(long, default_value_t = false)]
		skip: bool,

		/// Keep going after a failing action and report every failure at the
		/// end, overriding `fail_at_end` in the config file.
		#[arg(long, default_value_t = false)]
		fail_at_end: bool,
	},
	/// List the items that a run would process, without running anything.
	List {
		/// Output format. Use `text` for one item per line or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = ListFormat::Text)]
		format: ListFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
	/// One item per line, followed by its properties.
	Text,
	/// A JSON array of `{ "name", "properties" }` objects.
	Json,
}

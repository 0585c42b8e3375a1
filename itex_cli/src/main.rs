use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use itex_cli::Commands;
use itex_cli::ItexCli;
use itex_cli::ListFormat;
use itex_core::DryRunInvoker;
use itex_core::ExecInvoker;
use itex_core::ItexConfig;
use itex_core::ItexError;
use itex_core::IterationEngine;
use itex_core::SharedContext;
use itex_core::config::CONFIG_FILE_CANDIDATES;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter, e.g. `ITEX_LOG=debug`.
const LOG_ENV: &str = "ITEX_LOG";

/// Exit status when an action reported failure.
const EXIT_ITERATION_FAILURE: i32 = 1;
/// Exit status for configuration and invocation errors.
const EXIT_ERROR: i32 = 2;

/// Written by `itex init`.
const SAMPLE_CONFIG: &str = r##"# itex configuration

# Stop at the first failing action (false) or run everything and report all
# failures at the end (true).
fail_at_end = false

# Placeholder syntax: @item@, @item.basename@, @item.folder@, ...
# begin_token = "@"
# end_token = "@"
# iterator_name = "item"

# Configure exactly one item source.
[items]
list = ["one", "two", "three"]
# content = "one, two, three"
# delimiter = ","
# with_properties = [{ name = "one", properties = { site = "example.com" } }]

# Scan a folder instead of listing items.
# [items.folder]
# path = "modules"
# includes = ["*"]
# excludes = []
# depth = -1
# include_files = false
# full_path = false
# sort_order = "name"

# Properties exported to every action.
[properties]
greeting = "hello"

# Default version and base configuration per action.
[defaults."itex:exec"]
version = "1"

[[actions]]
id = "itex:exec"
goal = "shell"
configuration = { command = "echo $greeting @item@" }
"##;

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ItexCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Run {
			dry_run,
			skip,
			fail_at_end,
		}) => run_run(&args, dry_run, skip, fail_at_end),
		Some(Commands::List { format }) => run_list(&args, format),
		None => {
			eprintln!("No subcommand specified. Run `itex --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<ItexError>() {
			Ok(itex_err) => {
				let code = if itex_err.is_action_failure() {
					EXIT_ITERATION_FAILURE
				} else {
					EXIT_ERROR
				};
				let report: miette::Report = (*itex_err).into();
				eprintln!("{report:?}");
				process::exit(code);
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
				process::exit(EXIT_ERROR);
			}
		}
	}
}

/// Log to stderr without timestamps. `--verbose` forces debug output,
/// otherwise `ITEX_LOG` is used when set and `info` when not.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_ansi(use_color)
		.without_time()
		.init();
}

fn resolve_root(args: &ItexCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load the explicit `--config` file or discover one in `root`.
fn load_config(args: &ItexCli, root: &Path) -> Result<ItexConfig, ItexError> {
	if let Some(path) = &args.config {
		return ItexConfig::load_from(path);
	}

	ItexConfig::load(root)?.ok_or_else(|| {
		ItexError::ConfigNotFound {
			path: root.display().to_string(),
		}
	})
}

fn run_init(args: &ItexCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = ItexConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Edit {} to configure items and actions", config_path.display());
	println!("  2. Run `itex list` to see the items that will be processed");
	println!("  3. Run `itex run` to run every action for every item");

	Ok(())
}

fn run_run(
	args: &ItexCli,
	dry_run: bool,
	skip: bool,
	fail_at_end: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(args, &root)?;
	let engine = IterationEngine::from_config(&config, &root)?
		.skip(config.skip || skip)
		.fail_at_end(config.fail_at_end || fail_at_end);
	let mut context = SharedContext::from(config.properties.clone());

	let summary = if dry_run {
		let mut invoker = DryRunInvoker::new();
		engine.run(&mut context, &mut invoker)?
	} else {
		let mut invoker = ExecInvoker::new(&root);
		engine.run(&mut context, &mut invoker)?
	};

	if summary.skipped {
		println!("{}", colored!("Skipped.", yellow));
		return Ok(());
	}

	let verb = if dry_run { "Resolved" } else { "Ran" };
	println!(
		"{} {verb} {} action invocation(s) for {} item(s).",
		colored!("✓", green),
		summary.invocations,
		summary.items
	);

	Ok(())
}

fn run_list(args: &ItexCli, format: ListFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(args, &root)?;
	let engine = IterationEngine::from_config(&config, &root)?;
	let items = engine.items()?;

	if let ListFormat::Json = format {
		let items = items.unwrap_or_default();
		println!("{}", serde_json::to_string_pretty(&items)?);
		return Ok(());
	}

	let Some(items) = items else {
		println!("No item source configured.");
		return Ok(());
	};

	for item in &items {
		println!("{}", colored!(item.name, bold));
		for (key, value) in &item.properties {
			println!("  {key} = {value}");
		}
	}

	println!();
	println!("{} item(s)", items.len());

	Ok(())
}

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn itex_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("itex"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("ITEX_LOG");
	cmd
}

/// Write `content` to `itex.toml` in `root`.
pub fn write_config(root: &Path, content: &str) {
	std::fs::write(root.join("itex.toml"), content).unwrap_or_else(|e| panic!("write: {e}"));
}

//! Embeds a human-readable version string for `pingback --version`.
//!
//! The string is `<crate version> (<git describe>) <rustc version>`, with
//! the parts that cannot be determined left out. Outside a git checkout
//! only the crate version and the build date are used.

use std::process::Command;

use chrono::Utc;

fn main() {
    ["src", "build.rs", "Cargo.toml", "Cargo.lock"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", build_info());
}

/// Runs a command and returns its trimmed stdout when it succeeds with
/// non-empty output.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn git_version() -> String {
    command_output("git", &["describe", "--tags", "--always", "--dirty"])
        .unwrap_or_else(|| format!("built {}", Utc::now().format("%Y-%m-%d")))
}

fn build_info() -> String {
    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        Some(format!("({})", git_version())),
        command_output("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}

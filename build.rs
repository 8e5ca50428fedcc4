use std::process::Command;

const VERSION_ENV: &str = "TASKMASTER_VERSION";

/// `v1.2.3` -> `1.2.3`; anything not starting with a digit after `v` is kept.
fn strip_tag_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let version = match trimmed.strip_prefix('v') {
        Some(rest) if rest.starts_with(|ch: char| ch.is_ascii_digit()) => rest,
        _ => trimmed,
    };
    Some(version.to_string())
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    strip_tag_prefix(&String::from_utf8_lossy(&output.stdout))
}

fn main() {
    println!("cargo:rerun-if-env-changed={VERSION_ENV}");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let version = std::env::var(VERSION_ENV)
        .ok()
        .and_then(|raw| strip_tag_prefix(&raw))
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    println!("cargo:rustc-env=TASKMASTER_BUILD_VERSION={version}");
}

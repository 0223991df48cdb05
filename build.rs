// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=VISLAB_VERSION");

    // Packagers pin the version; otherwise ask git, then fall back to Cargo.toml
    let version = std::env::var("VISLAB_VERSION")
        .ok()
        .or_else(describe)
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// "v0.2.0-3-gabc1234" becomes "0.2.0-3-gabc1234"; a bare hash when untagged
fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty", "--match", "v*"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let text = text.strip_prefix('v').map(str::to_string).unwrap_or(text);
    (!text.is_empty()).then_some(text)
}

// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");

    // Packagers may pin the version explicitly
    let version = if let Ok(v) = std::env::var("QRAM_SCANNER_VERSION") {
        v
    } else {
        get_git_version()
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn get_git_version() -> String {
    let fallback = env!("CARGO_PKG_VERSION").to_string();

    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output();

    let described = match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => return fallback,
    };

    // "v0.1.0" -> "0.1.0", "v0.1.0-5-gabcdef1" -> "0.1.0-dirty-abcdef1"
    let described = described.strip_prefix('v').unwrap_or(&described);
    if described.contains('-') {
        let parts: Vec<&str> = described.rsplitn(3, '-').collect();
        if parts.len() >= 3 {
            let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
            return format!("{}-dirty-{}", parts[2], hash);
        }
    }

    if described.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        described.to_string()
    } else {
        // Untagged checkout: `git describe --always` printed a bare hash
        format!("{}-{}", fallback, described)
    }
}

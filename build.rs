use std::env;
use std::fs;
use std::path::PathBuf;

/// Packages whose versions change how an uploaded model or dataset is encoded.
const PINNED_PACKAGES: &[&str] = &["arrow", "arrow-csv", "bincode", "serde", "zstd"];

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let lock_path = manifest_dir.join("Cargo.lock");

    // No lockfile when built as a dependency
    if lock_path.exists() {
        println!("cargo:rerun-if-changed=Cargo.lock");
    } else {
        println!("cargo:rerun-if-changed=build.rs");
    }

    let mut lines = vec![format!(
        "{}=={}",
        env::var("CARGO_PKG_NAME").unwrap(),
        env::var("CARGO_PKG_VERSION").unwrap()
    )];

    match fs::read_to_string(&lock_path) {
        Ok(lock) => lines.extend(pinned_versions(&lock)),
        Err(e) => {
            println!(
                "cargo:warning=Cannot read {}: {}, requirements will only list this crate",
                lock_path.display(),
                e
            );
        }
    }

    let dest = out_dir.join("requirements.txt");
    if let Err(e) = fs::write(&dest, lines.join("\n") + "\n") {
        panic!("failed to write {}: {}", dest.display(), e);
    }
}

/// Scan `[[package]]` entries of a lockfile for the pinned packages.
fn pinned_versions(lock: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut name: Option<&str> = None;

    for line in lock.lines() {
        let line = line.trim();
        if line == "[[package]]" {
            name = None;
        } else if let Some(value) = line.strip_prefix("name = ") {
            name = Some(value.trim_matches('"'));
        } else if let Some(value) = line.strip_prefix("version = ") {
            if let Some(n) = name.take() {
                if PINNED_PACKAGES.contains(&n) {
                    found.push(format!("{}=={}", n, value.trim_matches('"')));
                }
            }
        }
    }

    found.sort();
    found.dedup();
    found
}

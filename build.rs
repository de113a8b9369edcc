use std::path::Path;

fn main() {
    let lockfile = Path::new(&std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default()).join("Cargo.lock");
    let version = locked_version(&lockfile, "casbin").unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CASBIN_CLI_ENGINE_VERSION={version}");

    println!("cargo:rerun-if-changed=Cargo.lock");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Version of `name` recorded in the lockfile, if there is one
fn locked_version(lockfile: &Path, name: &str) -> Option<String> {
    let text = std::fs::read_to_string(lockfile).ok()?;
    let wanted = format!("name = \"{name}\"");

    let mut lines = text.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if line != wanted {
            continue;
        }
        let version = lines.next()?.strip_prefix("version = \"")?.strip_suffix('"')?;
        if !version.is_empty() {
            return Some(version.to_string());
        }
    }
    None
}

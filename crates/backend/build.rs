use std::env;
use std::fs;
use std::path::Path;

/// Copies the workspace config.toml next to the built binary so the runtime
/// lookup (config next to the executable) works in dev builds too.
fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let profile = env::var("PROFILE").expect("PROFILE not set");

    // OUT_DIR sits under target/<profile>/build/backend-*/out
    let Some(target_dir) = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
    else {
        return;
    };

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root not found");

    let source = workspace_root.join("config.toml");
    if source.exists() {
        if let Err(e) = fs::copy(&source, target_dir.join("config.toml")) {
            println!("cargo:warning=Failed to copy config.toml: {}", e);
        }
    }
}

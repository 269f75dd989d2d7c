// Put data in the binary at compile time.
// The version shown at startup and by /health (package version when unset) can be set like:
// VERSION=1.0.0-rc20250129 cargo build

fn main() {
    // Read version from the environment variable
    let version = std::env::var("VERSION").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rerun-if-changed=src/build.rs");
    println!("cargo:rerun-if-env-changed=VERSION");
    // Pass the version to the Rust code
    println!("cargo:rustc-env=version={}", version);
}

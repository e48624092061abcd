//! Build script for detecting system dependencies and providing installation guidance.
//!
//! The serial transport links against libudev on Linux for port enumeration; this script
//! checks for it (and for pkg-config) and prints hints when they are missing.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Check for libudev (serial port enumeration on Linux)
    check_libudev();

    // Check for pkg-config
    check_pkg_config();

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

fn check_libudev() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");

    if !env::var("TARGET").unwrap_or_default().contains("linux") {
        return;
    }

    let output = Command::new("pkg-config").args(["--modversion", "libudev"]).output();

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:warning=Found libudev version: {}", version.trim());
        }
        _ => {
            println!("cargo:warning=libudev not found via pkg-config. Serial port support needs it.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libudev-dev");
            println!("cargo:warning=On Fedora: sudo dnf install systemd-devel");
        }
    }
}

fn check_pkg_config() {
    let output = Command::new("pkg-config").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:warning=Found pkg-config version: {}", version.trim());
        }
        _ => {
            println!("cargo:warning=pkg-config not found. This is required to find system libraries.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
        }
    }
}

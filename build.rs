//! Build script for detecting optional system tools and providing installation guidance.
//!
//! The desktop notification sink shells out to `notify-send`; this script
//! only warns when it is missing since the log sink works everywhere.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Check for notify-send (desktop notification sink on Linux)
    check_notify_send();
}

fn check_notify_send() {
    // Only check on Linux
    if !env::var("TARGET").unwrap_or_default().contains("linux") {
        return;
    }

    let output = Command::new("notify-send").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:warning=Found {}", version.trim());
        }
        _ => {
            println!("cargo:warning=notify-send not found. Desktop notifications will fall back to logging.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libnotify-bin");
        }
    }
}

//! # cvault
//!
//! Administrative client for clausevault login settings. The binary is
//! intentionally thin: the CLI lives in `src/cli/`, while this file only
//! invokes `cli::run()` and handles process termination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (src/cli/)                                       │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + dispatch (commands.rs)                  │
//! │  - Plain-text rendering (render.rs)                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  clausevault library                                        │
//! │  - init::initialize picks the settings backend once         │
//! │  - SettingsStore, classify, diagnostics                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

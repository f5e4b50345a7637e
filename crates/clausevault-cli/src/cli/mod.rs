//! # CLI Behavior
//!
//! This is **one possible client** for clausevault, not the application
//! itself. It is the only place that knows about terminal I/O, exit codes and
//! output formatting.
//!
//! ## Provisioning
//!
//! `cvault tenant add`, `cvault library add --tenant T` and
//! `cvault user add --tenant T [--library L]` stage an entity and save it
//! immediately. Omitting the ID generates one.
//!
//! `rm` refuses unknown IDs rather than silently succeeding, and never
//! cascades: removing a tenant leaves its libraries and users behind (the
//! sqlite backend rejects it instead while references remain).
//!
//! ## Classification
//!
//! `cvault classify 404` prints the message a failed remote call with that
//! status would produce. `--log` also appends it to today's diagnostic log.
//!
//! ## Module Structure
//!
//! - `commands`: Dispatch from parsed args to the library
//! - `render`: Output formatting
//! - `setup`: Argument parsing via clap

mod commands;
mod render;
pub mod setup;

pub use commands::run;

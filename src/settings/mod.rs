//! Settings are read from a TOML file (`--settings`, or `settings/dev.toml` in
//! debug builds) with `PROFILE_SERVICE__*` environment overrides.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

//! Layered settings: a TOML file chosen by `--settings` (or the build-profile
//! default), then `TOKENGATE__*` environment overrides.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

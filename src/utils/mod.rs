/// TOML configuration (`mindful.toml`).
pub mod toml_config;

//! Shared argument types for CLI commands.

use chatex::activation::{ActivationFlag, JsonFileStore};
use chatex::config::Config;
use chatex::error::LatexError;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Where configuration and the persisted preference live
#[derive(Args, Clone)]
pub struct SessionArgs {
    /// YAML configuration file; defaults are used when absent
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file holding the persisted preferences
    #[arg(long, default_value = ".chatex/preferences.json")]
    pub store: PathBuf,
}

impl SessionArgs {
    pub fn load_config(&self) -> Result<Config, LatexError> {
        match &self.config {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }

    pub fn store(&self) -> Arc<JsonFileStore> {
        Arc::new(JsonFileStore::new(&self.store))
    }

    pub fn flag(&self, config: &Config) -> ActivationFlag {
        ActivationFlag::new(self.store(), config.preference_key.clone())
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum SpansOutputFormat {
    Json,
    Text,
}

//! Subcommand implementations and the wiring they share.

pub mod chain;
pub mod config_cmd;
pub mod docs;
pub mod generate;
pub mod health;

use std::sync::Arc;

use baton_config::BatonConfig;
use baton_core::{DocumentStore, Options, Params, Reply};
use baton_engine::{Conductor, Generator};
use baton_memory::{FileStore, InMemoryStore};
use baton_providers::OllamaRuntime;

use crate::GenerationArgs;

/// The document store selected by `documents.path`.
pub fn build_store(config: &BatonConfig) -> Arc<dyn DocumentStore> {
    if config.documents.is_in_memory() {
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(FileStore::new(&config.documents.path))
    }
}

pub fn build_generator(config: &BatonConfig) -> Generator {
    Generator::new(
        Arc::new(OllamaRuntime::from_config(&config.generation)),
        config.generation.defaults(),
    )
}

pub fn build_conductor(config: &BatonConfig) -> Conductor {
    Conductor::new(build_generator(config), build_store(config))
        .with_collection(&config.documents.collection)
}

/// Parse a `key=value` template parameter.
///
/// The value is read as JSON when it parses (`n=3`, `tags=["a"]`) and as a
/// plain string otherwise.
pub fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl GenerationArgs {
    pub fn options(&self) -> Options {
        let mut options = Options::new().with_json_output(self.json);
        if let Some(tokens) = self.tokens {
            options = options.with_tokens(tokens);
        }
        if let Some(temperature) = self.temperature {
            options = options.with_temperature(temperature);
        }
        if let Some(model) = &self.model {
            options = options.with_model(model);
        }
        options
    }

    pub fn params(&self) -> Params {
        self.params.iter().cloned().collect()
    }

    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn print(&self, reply: &Reply) -> Result<(), Box<dyn std::error::Error>> {
        if self.full {
            println!("{}", serde_json::to_string_pretty(reply)?);
            return Ok(());
        }
        match &reply.data {
            serde_json::Value::String(text) => println!("{text}"),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        }
        Ok(())
    }
}

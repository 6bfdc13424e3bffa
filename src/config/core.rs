use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use super::{FetchConfig, PipelineConfig, RunnerConfig, SleepConfig};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

pub struct FanoutConfig {
    figment: Figment,
}

impl FanoutConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // If custom config is specified, use only that + defaults + env vars
        if let Some(custom_path) = custom_config {
            let path = Path::new(custom_path);
            if !path.is_file() {
                anyhow::bail!("Config file not found: {custom_path}");
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        } else {
            let user_base = Self::user_config_base_path();
            // Standard priority: user config -> repo config
            figment = figment
                .merge(Toml::file(format!("{user_base}.toml")))
                .merge(Json::file(format!("{user_base}.json")))
                .merge(Yaml::file(format!("{user_base}.yaml")))
                .merge(Yaml::file(format!("{user_base}.yml")))
                .merge(Toml::file("fanout.toml"))
                .merge(Json::file("fanout.json"))
                .merge(Yaml::file("fanout.yaml"))
                .merge(Yaml::file("fanout.yml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("FANOUT_").split("__"));

        Ok(FanoutConfig { figment })
    }

    /// Layer command-line values over one section.
    ///
    /// Fields serialized as absent (`None` with `skip_serializing_if`) leave
    /// the configured value alone.
    pub fn with_overrides<T: Serialize>(self, section: &str, overrides: T) -> Self {
        tracing::trace!("CONFIG LOAD: Applying CLI overrides for [{}]", section);
        Self {
            figment: self.figment.merge(Serialized::default(section, overrides)),
        }
    }

    /// Extract one section into its typed form
    pub fn section<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.figment
            .extract_inner(path)
            .with_context(|| format!("Invalid [{path}] configuration"))
    }

    pub fn runner(&self) -> Result<RunnerConfig> {
        let runner: RunnerConfig = self.section("runner")?;
        if !(1..=100).contains(&runner.thread_percentage) {
            anyhow::bail!(
                "runner.thread_percentage must be between 1 and 100, got {}",
                runner.thread_percentage
            );
        }
        Ok(runner)
    }

    pub fn sleep(&self) -> Result<SleepConfig> {
        self.section("sleep")
    }

    pub fn fetch(&self) -> Result<FetchConfig> {
        let fetch: FetchConfig = self.section("fetch")?;
        if fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs cannot be 0");
        }
        Ok(fetch)
    }

    pub fn pipeline(&self) -> Result<PipelineConfig> {
        self.section("pipeline")
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        let value = self.figment.extract()?;
        Ok(value)
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/fanout/config"),
            Err(_) => "~/.config/fanout/config".to_string(),
        }
    }
}

//! Exporter configuration
//!
//! Read from an optional `nsxt-exporter.{toml,yaml,json}` file in the working
//! directory, then overridden by `NSXT_*` environment variables.

use anyhow::{bail, Result};
use exporter_lib::{ClientConfig, Registry};
use serde::{Deserialize, Deserializer};

/// Exporter configuration
#[derive(Clone, Deserialize)]
pub struct ExporterConfig {
    /// Manager base URL, e.g. `https://nsx-manager.example.com`
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Accept invalid manager certificates
    #[serde(default)]
    pub insecure: bool,

    /// Port serving /metrics, /healthz and /readyz
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Collector keys to enable; empty enables all
    #[serde(default, deserialize_with = "collector_list")]
    pub collectors: Vec<String>,
}

fn default_listen_port() -> u16 {
    9744
}

/// Accept a list from a config file or a comma-separated string from the environment
fn collector_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keys {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Keys::deserialize(deserializer)? {
        Keys::List(keys) => keys,
        Keys::Csv(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

impl ExporterConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("nsxt-exporter").required(false))
            .add_source(environment());

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("NSXT_HOST must be set to the NSX-T manager URL");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            insecure: self.insecure,
        }
    }

    /// Narrow `registry` to the configured collectors.
    ///
    /// Fails on a key the registry does not know.
    pub fn select_collectors<A: ?Sized>(&self, registry: &mut Registry<A>) -> Result<()> {
        if self.collectors.is_empty() {
            return Ok(());
        }

        if let Some(unknown) = self.collectors.iter().find(|c| !registry.contains(c)) {
            let known: Vec<&str> = registry.keys().collect();
            bail!(
                "Unknown collector {unknown:?}, expected one of: {}",
                known.join(", ")
            );
        }

        registry.retain(|key| self.collectors.iter().any(|c| c == key));
        Ok(())
    }
}

// Values stay strings; serde converts the typed fields, so credentials are
// never reinterpreted as numbers
fn environment() -> config::Environment {
    config::Environment::with_prefix("NSXT")
}

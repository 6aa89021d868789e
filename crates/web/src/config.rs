use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Startup settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
    pub assets_dir: PathBuf,
    /// Overrides the shuffle seed from `game.json`.
    pub seed: Option<u64>,
    /// Players silent for longer than this are disconnected. Zero disables it.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 3000,
            assets_dir: PathBuf::from("assets"),
            seed: None,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key).and_then(|value| value.into_string().ok()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(addr) = lookup("CROSSCARDS_ADDR") {
            config.addr = addr;
        }
        if let Some(port) = parsed(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(dir) = lookup("CROSSCARDS_ASSETS") {
            config.assets_dir = PathBuf::from(dir);
        }
        config.seed = parsed(&lookup, "CROSSCARDS_SEED")?;
        if let Some(secs) = parsed(&lookup, "CROSSCARDS_IDLE_SECS")? {
            config.idle_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid {key}={raw:?}"))?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}

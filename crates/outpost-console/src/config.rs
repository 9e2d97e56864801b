use serde::{
    Deserialize,
    Serialize,
};

/// Process configuration read from the environment at startup.
///
/// Connection parameters (chain, application, registry path, private key)
/// are per-command CLI arguments with their own `OUTPOST_*` environment
/// fallbacks; only what main needs before argument parsing lives here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Filter directives for the log subscriber.
    #[serde(default = "default_log")]
    pub log: String,
}

impl outpost_config::Config for ConsoleConfig {
    const PREFIX: &'static str = "OUTPOST_";
}

fn default_log() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::ConsoleConfig;

    #[test]
    fn log_directive_defaults_to_info() {
        let config: ConsoleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.log, "info");
    }
}

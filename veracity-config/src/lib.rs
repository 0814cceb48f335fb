//! Loader for `veracity.yaml` with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files and inline
//! snippets in the order they were added, then `VERACITY__`-prefixed
//! environment variables (`VERACITY__SEARCH__AUTH_TOKEN` sets
//! `search.auth_token`). `${VAR}` placeholders in string values are expanded
//! after merging, recursively up to a fixed depth.
//!
//! ```yaml
//! version: "1"
//! server:    { bind: "127.0.0.1", port: 5000, session_mailbox: 32, session_idle_secs: 1800 }
//! llm:       { provider: gemini, model: gemini-2.5-flash, auth_token: "${GEMINI_API_KEY}" }
//! search:    { provider: serper, auth_token: "${SERPER_API_KEY}", max_results: 5 }
//! extractor: { max_chars: 5000, timeout_secs: 10 }
//! agent:     { history_turns: 10, max_statements: 5, statement_max_len: 512, query_max_chars: 150 }
//! logging:   { format: text, stderr: true, filter: info }
//! ```
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use veracity_common::observability::{LogConfig, LogFormat};
use veracity_common::{AgentConfig, ExtractorConfig, LlmConfig, SearchConfig};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Prefix for environment overrides; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "VERACITY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VeracityConfig {
    pub version: Option<String>,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub extractor: ExtractorConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Bounded mailbox size of each chat session actor.
    pub session_mailbox: usize,
    /// Chat sessions with no message for this many seconds are dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
            session_mailbox: 32,
            session_idle_secs: 1800,
        }
    }
}

impl ServerConfig {
    /// Zero is bumped to one second.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs.max(1))
    }

    /// `bind:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub stderr: bool,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            stderr: true,
            filter: "info".into(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct VeracityConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for VeracityConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl VeracityConfigLoader {
    /// Defaults only; environment overrides are applied last in [`Self::load`].
    ///
    /// ```
    /// use veracity_config::VeracityConfigLoader;
    ///
    /// let config = VeracityConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nserver:\n  port: 8080")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.server.port, 8080);
    /// assert_eq!(config.server.bind, "127.0.0.1");
    /// assert_eq!(config.agent.history_turns, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment prefix (tests isolate themselves this way).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent (headless deployments run on env alone).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use veracity_common::SearchConfig;
    /// use veracity_config::VeracityConfigLoader;
    ///
    /// let cfg = VeracityConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// search:
    ///   provider: brave
    ///   auth_token: "example"
    ///   max_results: 3
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(matches!(cfg.search, SearchConfig::Brave { max_results: 3, .. }));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and deserialize.
    pub fn load(self) -> Result<VeracityConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: VeracityConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Lagos")), ("STATE", Some("LA"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Lagos", { "loc": "Lagos-LA" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${VERACITY_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${VERACITY_DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_without_any_source() {
        let cfg = VeracityConfigLoader::new()
            .with_env_prefix("VERACITY_UNIT_EMPTY")
            .load()
            .unwrap();
        assert_eq!(cfg.server, ServerConfig::default());
        assert_eq!(cfg.server.address(), "127.0.0.1:5000");
        assert!(matches!(cfg.llm, LlmConfig::None));
        assert!(matches!(cfg.search, SearchConfig::None));
        assert_eq!(cfg.extractor.max_chars, 5000);
        assert_eq!(cfg.agent.query_max_chars, 150);
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn ipv6_bind_is_bracketed() {
        let server = ServerConfig {
            bind: "::1".into(),
            port: 8080,
            session_mailbox: 1,
            session_idle_secs: 60,
        };
        assert_eq!(server.address(), "[::1]:8080");
        assert_eq!(server.session_idle(), Duration::from_secs(60));
    }
}

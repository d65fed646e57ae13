//! Loader for test-session configuration with YAML + environment overlays.
//!
//! The original property scatter is collapsed into one explicit struct,
//! [`SessionConfig`], so every knob the driver factory consumes is
//! enumerable and overridable. Sources are merged in order: YAML file (or
//! inline snippet), then `VIGIL_`-prefixed environment variables, with
//! `${VAR}` placeholders expanded after the merge.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Everything the driver factory needs to provision one browser session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Where the session runs: `local`, `remote`, or `localgrid`.
    #[serde(default = "default_execution_mode")]
    pub execution_mode: String,
    /// Browser identity: `chrome`, `firefox`, `edge`, or `internet_explorer`.
    #[serde(default = "default_browser")]
    pub browser: String,
    /// Implicit element-lookup wait applied to the session.
    #[serde(default = "default_implicit_wait_secs")]
    pub implicit_wait_secs: u64,
    /// Asynchronous script timeout applied to the session.
    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,
    /// Page-load timeout applied to the session.
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,
    /// Wrap the session so clicks and text entry wait out the loading overlay.
    #[serde(default)]
    pub enable_loading_guard: bool,
    /// Browser download directory. Defaults to `<cwd>/target/downloads`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Endpoint of the WebDriver service (chromedriver, geckodriver, ...).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Hub endpoint used when `execution_mode` is `localgrid`.
    #[serde(default)]
    pub grid_url: Option<String>,
    /// CSS selector for the loading indicator; overrides the built-in one.
    #[serde(default)]
    pub loading_indicator: Option<String>,
    /// Pattern handed to Chrome's integrated-auth allowlist switches.
    #[serde(default)]
    pub auth_server_allowlist: Option<String>,
}

fn default_execution_mode() -> String {
    "local".into()
}
fn default_browser() -> String {
    "chrome".into()
}
fn default_implicit_wait_secs() -> u64 {
    10
}
fn default_script_timeout_secs() -> u64 {
    30
}
fn default_page_load_timeout_secs() -> u64 {
    60
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            execution_mode: default_execution_mode(),
            browser: default_browser(),
            implicit_wait_secs: default_implicit_wait_secs(),
            script_timeout_secs: default_script_timeout_secs(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            enable_loading_guard: false,
            download_dir: None,
            webdriver_url: default_webdriver_url(),
            grid_url: None,
            loading_indicator: None,
            auth_server_allowlist: None,
        }
    }
}

impl SessionConfig {
    /// Resolved download directory, applying the default when unset.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("target")
                .join("downloads")
        })
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

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct SessionConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SessionConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfigLoader {
    /// Start an empty loader. `VIGIL_`-prefixed environment variables are
    /// layered on top of every attached source at [`load`](Self::load) time,
    /// so the environment always wins.
    ///
    /// ```
    /// use vigil_config::SessionConfigLoader;
    ///
    /// let config = SessionConfigLoader::new()
    ///     .with_yaml_str("browser: firefox")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.browser, "firefox");
    /// assert_eq!(config.execution_mode, "local");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Same as [`with_file`](Self::with_file), but a missing file is not an
    /// error; defaults and environment variables carry the load.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into the
    /// strongly typed [`SessionConfig`].
    ///
    /// `${VAR}` placeholders are expanded recursively (depth-capped, so
    /// cycles terminate); unknown variables are left intact.
    ///
    /// ```
    /// use vigil_config::SessionConfigLoader;
    ///
    /// std::env::set_var("STAGING_GRID", "http://grid.staging:4444");
    ///
    /// let config = SessionConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// execution_mode: localgrid
    /// grid_url: "${STAGING_GRID}/wd/hub"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(
    ///     config.grid_url.as_deref(),
    ///     Some("http://grid.staging:4444/wd/hub")
    /// );
    ///
    /// std::env::remove_var("STAGING_GRID");
    /// ```
    pub fn load(self) -> Result<SessionConfig, ConfigError> {
        // Environment goes in last: the config crate gives later sources
        // precedence.
        let cfg = self
            .builder
            .add_source(Environment::with_prefix("VIGIL").try_parsing(true))
            .build()?;

        // Convert to serde_json::Value first so placeholder expansion can
        // walk nested values uniformly.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SessionConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use temp_env;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                // HUB references HOST; URL references HUB — two hops.
                ("HOST", Some("grid.internal")),
                ("HUB", Some("http://${HOST}:4444")),
                ("URL", Some("${HUB}/wd/hub")),
            ],
            || {
                let mut v = json!("${URL}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("http://grid.internal:4444/wd/hub"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // The depth cap guarantees termination; the exact remainder is
            // unspecified beyond still containing an unresolved placeholder.
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let cfg = SessionConfigLoader::new().load().expect("defaults load");
        assert_eq!(cfg.execution_mode, "local");
        assert_eq!(cfg.browser, "chrome");
        assert_eq!(cfg.webdriver_url, "http://localhost:9515");
        assert!(!cfg.enable_loading_guard);
        assert!(cfg.download_dir.is_none());
    }
}

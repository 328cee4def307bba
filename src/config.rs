use crate::compiler::{Dialect, ScriptOptions};
use crate::{RecorderError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

static BINDING_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid binding regex"));

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    pub chrome_path: Option<PathBuf>,
    #[serde(default)]
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Recording target and artifact capture settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Where screenshot artifacts are written. Defaults to the user cache dir.
    pub artifacts_dir: Option<PathBuf>,
    #[serde(default = "default_capture_format")]
    pub capture_format: String,
    #[serde(default = "default_capture_quality")]
    pub capture_quality: u8,
    /// A capture slower than this degrades to the "unavailable" artifact.
    #[serde(default = "default_capture_timeout")]
    pub capture_timeout_ms: u64,
    /// Name of the page-side function the injected recorder calls.
    #[serde(default = "default_binding_name")]
    pub binding_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_dialect")]
    pub dialect: String,
    #[serde(default = "default_suite_name")]
    pub suite_name: String,
    #[serde(default = "default_test_name")]
    pub test_name: String,
    #[serde(default)]
    pub json_pretty: bool,
}

fn default_window_width() -> u32 {
    1024
}
fn default_window_height() -> u32 {
    768
}
fn default_capture_format() -> String {
    "jpeg".to_string()
}
fn default_capture_quality() -> u8 {
    80
}
fn default_capture_timeout() -> u64 {
    crate::timeouts::ms::CAPTURE
}
fn default_binding_name() -> String {
    "__testpilot__".to_string()
}
fn default_dialect() -> String {
    Dialect::CypressJavascript.name().to_string()
}
fn default_suite_name() -> String {
    ScriptOptions::DEFAULT_SUITE.to_string()
}
fn default_test_name() -> String {
    ScriptOptions::DEFAULT_TEST.to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: false,
            user_data_dir: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: None,
            capture_format: default_capture_format(),
            capture_quality: default_capture_quality(),
            capture_timeout_ms: default_capture_timeout(),
            binding_name: default_binding_name(),
        }
    }
}

impl RecordingConfig {
    pub fn resolved_artifacts_dir(&self) -> PathBuf {
        self.artifacts_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("testpilot")
                .join("artifacts")
        })
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            suite_name: default_suite_name(),
            test_name: default_test_name(),
            json_pretty: false,
        }
    }
}

impl OutputConfig {
    pub fn script_options(&self) -> ScriptOptions {
        ScriptOptions {
            suite_name: self.suite_name.clone(),
            test_name: self.test_name.clone(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    default_config_dir().map(|p| p.join("config.toml"))
}

pub fn default_config_dir() -> Result<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .or_else(dirs::config_dir)
        .map(|p| p.join("testpilot"))
        .ok_or_else(|| RecorderError::ConfigError("Could not determine config directory".into()))
}

fn read_table(path: &std::path::Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn overlay(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => overlay(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut layers = Vec::new();

        let global_path = default_config_path()?;
        if global_path.exists() {
            layers.push(read_table(&global_path)?);
        }

        let project_path = PathBuf::from(".testpilot.toml");
        if project_path.exists() {
            layers.push(read_table(&project_path)?);
        }

        let mut config = Self::from_layers(layers)?;
        config.load_from_env();

        Ok(config)
    }

    /// Builds a config from TOML layers, lowest precedence first.
    ///
    /// Later layers win key by key; sections merge rather than replace.
    fn from_layers(layers: impl IntoIterator<Item = toml::Table>) -> Result<Self> {
        let mut merged = toml::Table::new();
        for layer in layers {
            overlay(&mut merged, layer);
        }
        Ok(toml::Value::Table(merged).try_into()?)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn load_with_overrides(&self, cli_overrides: ConfigOverrides) -> Self {
        let mut config = self.clone();

        if let Some(headless) = cli_overrides.headless {
            config.browser.headless = headless;
        }
        if let Some(chrome_path) = cli_overrides.chrome_path {
            config.browser.chrome_path = Some(chrome_path);
        }
        if let Some(json) = cli_overrides.json {
            config.output.json_pretty = json;
        }
        if let Some(dialect) = cli_overrides.dialect {
            config.output.dialect = dialect;
        }
        if let Some(dir) = cli_overrides.artifacts_dir {
            config.recording.artifacts_dir = Some(dir);
        }

        config
    }

    fn load_from_env(&mut self) {
        if let Ok(path) = std::env::var("TESTPILOT_CHROME_PATH") {
            self.browser.chrome_path = Some(PathBuf::from(path));
        }
        if let Ok(headless) = std::env::var("TESTPILOT_HEADLESS") {
            self.browser.headless = headless == "true" || headless == "1";
        }
        if let Ok(dialect) = std::env::var("TESTPILOT_DIALECT")
            && !dialect.is_empty()
        {
            self.output.dialect = dialect;
        }
    }

    pub fn dialect(&self) -> Result<Dialect> {
        self.output.dialect.parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(RecorderError::ConfigError(
                "window_width and window_height must be greater than 0".into(),
            ));
        }

        if self.recording.capture_quality < 1 || self.recording.capture_quality > 100 {
            return Err(RecorderError::ConfigError(
                "capture_quality must be between 1 and 100".into(),
            ));
        }

        if self.recording.capture_timeout_ms == 0 {
            return Err(RecorderError::ConfigError(
                "capture_timeout_ms must be greater than 0".into(),
            ));
        }

        if !matches!(
            self.recording.capture_format.as_str(),
            "png" | "jpeg" | "webp"
        ) {
            return Err(RecorderError::ConfigError(format!(
                "capture_format must be png, jpeg or webp (got '{}')",
                self.recording.capture_format
            )));
        }

        if !BINDING_NAME.is_match(&self.recording.binding_name) {
            return Err(RecorderError::ConfigError(format!(
                "binding_name '{}' is not a valid JavaScript identifier",
                self.recording.binding_name
            )));
        }

        self.dialect()
            .map_err(|e| RecorderError::ConfigError(e.to_string()))?;

        if let Some(ref path) = self.browser.chrome_path
            && !path.exists()
        {
            return Err(RecorderError::ConfigError(format!(
                "Chrome path does not exist: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn show_masked(&self) -> String {
        format!(
            r#"Browser:
  Chrome Path: {}
  Headless: {}
  Window: {}x{}

Recording:
  Artifacts Dir: {}
  Capture: {} (quality {}, timeout {}ms)
  Binding: {}

Output:
  Dialect: {}
  Suite: {}
  Test: {}
"#,
            self.browser
                .chrome_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto-detect".into()),
            self.browser.headless,
            self.browser.window_width,
            self.browser.window_height,
            self.recording.resolved_artifacts_dir().display(),
            self.recording.capture_format,
            self.recording.capture_quality,
            self.recording.capture_timeout_ms,
            self.recording.binding_name,
            self.output.dialect,
            self.output.suite_name,
            self.output.test_name,
        )
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub headless: Option<bool>,
    pub chrome_path: Option<PathBuf>,
    pub json: Option<bool>,
    pub dialect: Option<String>,
    pub artifacts_dir: Option<PathBuf>,
}

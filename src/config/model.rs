// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// poll_interval_ms = 500
/// script_dir = "scripts"
///
/// [engine]
/// interpreter = "sh"
/// args = []
///
/// [watch]
/// paths = ["init.sh"]
/// exclude = ["*.swp", "*.tmp", "*~"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Execution engine settings from `[engine]`.
    #[serde(default)]
    pub engine: EngineSection,

    /// Initial watch set and event excludes from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How often the reconciler polls for filesystem events, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Directory containing the scripts, relative to the config file.
    #[serde(default = "default_script_dir")]
    pub script_dir: String,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_script_dir() -> String {
    "scripts".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            script_dir: default_script_dir(),
        }
    }
}

/// `[engine]` section.
///
/// Controls how the process engine executes a script file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineSection {
    /// Interpreter to run scripts with (e.g. `"sh"`, `"python3"`).
    ///
    /// If `None`, the script file itself is executed and must be runnable
    /// (shebang + executable bit on unix).
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Extra arguments passed to the interpreter before the script path.
    #[serde(default)]
    pub args: Vec<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Paths (relative to `script_dir`) watched at startup.
    ///
    /// Scripts can pull in further paths at runtime through their context.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Glob patterns for filesystem events to ignore (editor swap files etc).
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_exclude() -> Vec<String> {
    vec![
        "*.swp".to_string(),
        "*.tmp".to_string(),
        "*~".to_string(),
        ".git/**".to_string(),
    ]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: default_exclude(),
        }
    }
}

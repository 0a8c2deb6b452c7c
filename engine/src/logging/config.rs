use std::collections::HashMap;
use std::fmt;
use tracing::Level;

/// Scopes used by the logging macros in this crate.
pub const SCOPES: [&str; 7] = [
    "physics",
    "input",
    "interaction",
    "teleport",
    "scene",
    "assets",
    "frame",
];

/// Crates whose events go through the scoped macros.
const SCOPED_TARGETS: [&str; 2] = ["engine", "grabvr"];

/// Per-scope log level filter, parsed from strings like `warn,physics=debug`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    global_level: Level,
    scope_levels: HashMap<String, Level>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level '{}'", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            global_level: Level::WARN,
            scope_levels: HashMap::new(),
        }
    }

    pub fn from_env(env_var_name: &str) -> Self {
        let mut config = Self::new();

        if let Ok(value) = std::env::var(env_var_name) {
            config.apply(&value);
        }

        config
    }

    pub fn parse(config_str: &str) -> Self {
        let mut config = Self::new();
        config.apply(config_str);
        config
    }

    /// Malformed entries are skipped so a typo never disables logging entirely.
    fn apply(&mut self, config_str: &str) {
        for part in config_str.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((scope, level)) => {
                    if let Ok(level) = parse_level(level.trim()) {
                        self.scope_levels.insert(scope.trim().to_string(), level);
                    }
                }
                None => {
                    if let Ok(level) = parse_level(part) {
                        self.global_level = level;
                    }
                }
            }
        }
    }

    pub fn should_log(&self, scope: &str, level: Level) -> bool {
        let target_level = self.scope_levels.get(scope).unwrap_or(&self.global_level);
        level <= *target_level
    }

    pub fn global_level(&self) -> Level {
        self.global_level
    }

    pub fn scope_level(&self, scope: &str) -> Option<Level> {
        self.scope_levels.get(scope).copied()
    }

    pub fn set_global_level(&mut self, level: Level) {
        self.global_level = level;
    }

    pub fn set_scope_level(&mut self, scope: impl Into<String>, level: Level) {
        self.scope_levels.insert(scope.into(), level);
    }

    /// Most verbose level any scope is allowed to log at.
    pub fn max_level(&self) -> Level {
        self.scope_levels
            .values()
            .copied()
            .fold(self.global_level, Level::max)
    }

    /// Subscriber directives: unscoped events follow the global level, while the
    /// scoped crates pass up to `max_level` and leave the rest to `should_log`.
    pub fn filter_directives(&self) -> String {
        let global = self.global_level.as_str().to_lowercase();
        let scoped = self.max_level().as_str().to_lowercase();
        let mut directives = vec![global];
        for target in SCOPED_TARGETS {
            directives.push(format!("{}={}", target, scoped));
        }
        directives.join(",")
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_level(level_str: &str) -> Result<Level, UnknownLevel> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        other => Err(UnknownLevel(other.to_string())),
    }
}

/// Install the fmt subscriber and the scope filter read from `env_var_name`,
/// e.g. `init_logging("GRABVR_LOG")` with `GRABVR_LOG=info,teleport=debug`.
pub fn init_logging(env_var_name: &str) -> LogConfig {
    let config = LogConfig::from_env(env_var_name);

    // RUST_LOG, when set, replaces the filter built from the scope config.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.filter_directives()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    super::set_log_config(config.clone());
    config
}

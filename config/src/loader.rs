use crate::{ConfigError, MyemConfig};
use regex::Regex;
use std::path::PathBuf;

const ENV_VAR_PATTERN: &str = r"\$\{([^}]+)\}";

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/myem/myem.yaml"));
        }
        search_paths.push(PathBuf::from("./myem.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/myem/myem.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    /// A loader that skips every config file and reads the environment only.
    pub fn env_only() -> Self {
        Self {
            explicit_file: None,
            search_paths: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<MyemConfig, ConfigError> {
        let mut config = MyemConfig::default();

        if let Ok(env_path) = std::env::var("MYEM_CONFIG") {
            config = self.read_file(&PathBuf::from(env_path))?;
        } else if let Some(ref explicit) = self.explicit_file {
            config = self.read_file(explicit)?;
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        tracing::debug!(path = %path.display(), "Merging config file");
                        config = self.merge_yaml(&config, &content)?;
                    }
                }
            }
        }

        apply_overrides(&mut config, |name| std::env::var(name).ok());
        Ok(config)
    }

    fn read_file(&self, path: &PathBuf) -> Result<MyemConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        self.parse_yaml(&content)
    }

    fn parse_yaml(&self, content: &str) -> Result<MyemConfig, ConfigError> {
        let expanded = self.expand_env_vars(content)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(&self, base: &MyemConfig, content: &str) -> Result<MyemConfig, ConfigError> {
        let overlay = self.parse_yaml(content)?;
        Ok(merge_configs(base, &overlay))
    }

    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        Ok(re
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_default()
            })
            .to_string())
    }
}

fn merge_configs(base: &MyemConfig, overlay: &MyemConfig) -> MyemConfig {
    let defaults = MyemConfig::default();
    let mut result = base.clone();

    if overlay.database.scheme != defaults.database.scheme {
        result.database.scheme = overlay.database.scheme.clone();
    }
    merge_option(&mut result.database.host, &overlay.database.host);
    merge_option(&mut result.database.user, &overlay.database.user);
    merge_option(&mut result.database.password, &overlay.database.password);
    merge_option(&mut result.database.name, &overlay.database.name);

    merge_option(&mut result.jwt.public_key_url, &overlay.jwt.public_key_url);

    merge_option(&mut result.broker.network_uri, &overlay.broker.network_uri);
    merge_option(&mut result.broker.backbone_uri, &overlay.broker.backbone_uri);
    if overlay.broker.exchange_type != defaults.broker.exchange_type {
        result.broker.exchange_type = overlay.broker.exchange_type;
    }

    if overlay.throttle != defaults.throttle {
        result.throttle = overlay.throttle.clone();
    }
    if overlay.logging.level != defaults.logging.level
        || overlay.logging.format != defaults.logging.format
        || !overlay.logging.filter.is_empty()
    {
        result.logging = overlay.logging.clone();
    }

    result
}

fn merge_option(target: &mut Option<String>, overlay: &Option<String>) {
    if overlay.is_some() {
        target.clone_from(overlay);
    }
}

/// Apply the environment variables the services are deployed with.
///
/// `lookup` resolves a variable name; [`ConfigLoader::load`] passes the process
/// environment.
pub(crate) fn apply_overrides<F>(config: &mut MyemConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(scheme) = lookup("DB_SCHEME") {
        if !scheme.is_empty() {
            config.database.scheme = scheme;
        }
    }
    if let Some(host) = lookup("DB_HOST") {
        config.database.host = Some(host);
    }
    if let Some(user) = lookup("DB_USER") {
        config.database.user = Some(user);
    }
    if let Some(password) = lookup("DB_PASSWORD") {
        config.database.password = Some(password);
    }
    if let Some(name) = lookup("DB_NAME") {
        config.database.name = Some(name);
    }
    if let Some(url) = lookup("PUBLIC_KEY_URL") {
        config.jwt.public_key_url = Some(url);
    }
    if let Some(uri) = lookup("RABBITMQ_URI") {
        config.broker.network_uri = Some(uri);
    }
    if let Some(uri) = lookup("BACKBONE_RABBITMQ_URI") {
        config.broker.backbone_uri = Some(uri);
    }
    if let Some(level) = lookup("MYEM_LOG_LEVEL") {
        if let Ok(l) = serde_yaml::from_str(&level) {
            config.logging.level = l;
        }
    }
    if let Some(filter) = lookup("MYEM_LOG_FILTER") {
        config.logging.filter = filter;
    }
}

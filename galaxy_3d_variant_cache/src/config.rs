//! Resource manager configuration

/// Version directive substituted when a source file has none
pub const DEFAULT_VERSION_LINE: &str = "#version 450";

/// ResourceManager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceManagerConfig {
    /// Version directive used for sources missing one (MalformedSource)
    pub default_version_line: String,
    /// When false, `tick()` never polls files; it only finishes a forced reload
    pub hot_reload_enabled: bool,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            default_version_line: DEFAULT_VERSION_LINE.to_string(),
            hot_reload_enabled: true,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

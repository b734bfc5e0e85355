//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-ventlink-server`, `--debug-ventlink-control`,
//! etc. to raise one crate to debug level without flooding the console.

use std::collections::HashMap;
use std::env;

use crate::KNOWN_CRATES;

/// Debug flags parsed from command-line arguments
///
/// # Example
/// ```rust
/// use ventlink_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-ventlink-server".to_string()]);
/// assert!(flags.is_enabled("ventlink-server"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
}

impl CrateDebugFlags {
    /// Collect every `--debug-<crate>` argument; `--debug-all` enables the whole workspace
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
                continue;
            }

            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }

        flags
    }

    /// Merge a `VENTLINK_DEBUG`-style value: `all` or comma-separated crate names
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enable(crate_name);
            }
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string(), true);
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    pub fn enabled_crates(&self) -> Vec<&String> {
        self.enabled_crates.keys().collect()
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// DEBUG for flagged crates, INFO for the rest
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives for the flagged crates followed by `default_level`
    ///
    /// Format: `ventlink_server=debug,info`. Crate names are converted to their
    /// module path form since `tracing` targets use underscores.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut names: Vec<&String> = self.enabled_crates.keys().collect();
        names.sort();

        let mut filters: Vec<String> = names
            .into_iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_string());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and `VENTLINK_DEBUG`
///
/// Environment variable format: `all` or comma-separated crate names, e.g.
/// `ventlink-server,ventlink-control`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var("VENTLINK_DEBUG") {
        flags.merge_env_value(&env_var);
    }

    flags
}

/// `--help` section listing the debug flags and known crates
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  VENTLINK_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  VENTLINK_DEBUG=all                               Enable debug for all crates

Examples:
  --debug-ventlink-server
  VENTLINK_DEBUG=ventlink-server,ventlink-control
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-ventlink-server".to_string()]);
        assert!(flags.is_enabled("ventlink-server"));
        assert!(!flags.is_enabled("ventlink-control"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_unrelated_args_ignored() {
        let flags = CrateDebugFlags::from_args(vec![
            "ventlinkd".to_string(),
            "--port".to_string(),
            "5000".to_string(),
        ]);
        assert!(!flags.any_enabled());
        assert_eq!(flags.to_filter_string("info"), "info");
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_env_value("ventlink-server, ventlink-control,");
        assert!(flags.is_enabled("ventlink-server"));
        assert!(flags.is_enabled("ventlink-control"));
        assert_eq!(flags.enabled_crates().len(), 2);
    }

    #[test]
    fn test_filter_string_uses_module_paths() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-ventlink-server".to_string(),
            "--debug-ventlink-control".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string("warn"),
            "ventlink_control=debug,ventlink_server=debug,warn"
        );
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-ventlink-server".to_string()]);
        assert_eq!(flags.log_level("ventlink-server"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("ventlink-hal"), tracing::Level::INFO);
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DagrunError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DagrunConfig {
    #[serde(default)]
    pub guard: GuardConfig,
}

/// Settings for the panic boundary around step logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Emit a `warn` event for every intercepted panic (default: true).
    #[serde(default = "default_log_panics")]
    pub log_panics: bool,
    /// Message used when a panic payload has no textual form.
    #[serde(default = "default_opaque_payload_message")]
    pub opaque_payload_message: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            log_panics: default_log_panics(),
            opaque_payload_message: default_opaque_payload_message(),
        }
    }
}

fn default_log_panics() -> bool { true }
fn default_opaque_payload_message() -> String { "panic with non-string payload".to_string() }

impl DagrunConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| DagrunError::ConfigNotFound(path.display().to_string()))?;
        Self::from_toml(&expand_env_vars(&content))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DagrunError::Config(e.to_string()))
    }
}

/// Replace `${NAME}` with the value of env var `NAME`. Unset vars are left as is.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = DagrunConfig::from_toml("").unwrap();
        assert!(config.guard.log_panics);
        assert_eq!(
            config.guard.opaque_payload_message,
            "panic with non-string payload"
        );
    }

    #[test]
    fn test_guard_section() {
        let config = DagrunConfig::from_toml(
            r#"
[guard]
log_panics = false
opaque_payload_message = "step aborted"
"#,
        )
        .unwrap();
        assert!(!config.guard.log_panics);
        assert_eq!(config.guard.opaque_payload_message, "step aborted");
    }

    #[test]
    fn test_invalid_toml() {
        let err = DagrunConfig::from_toml("[guard]\nlog_panics = \"maybe\"").unwrap_err();
        assert!(matches!(err, DagrunError::Config(_)));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_DAGRUN_MSG", "hello");
        let result = expand_env_vars("msg = \"${TEST_DAGRUN_MSG}!\"");
        assert_eq!(result, "msg = \"hello!\"");
        std::env::remove_var("TEST_DAGRUN_MSG");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("msg = \"${NONEXISTENT_DAGRUN_VAR}\"");
        assert_eq!(result, "msg = \"${NONEXISTENT_DAGRUN_VAR}\"");
    }

    #[test]
    fn test_expand_env_vars_unterminated() {
        assert_eq!(expand_env_vars("a ${OPEN"), "a ${OPEN");
    }

    #[test]
    fn test_load_from_file() {
        std::env::set_var("TEST_DAGRUN_OPAQUE", "opaque panic");
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"[guard]\nopaque_payload_message = \"${TEST_DAGRUN_OPAQUE}\"\n")
            .expect("write toml");

        let config = DagrunConfig::load(tmp.path()).expect("load config");
        assert_eq!(config.guard.opaque_payload_message, "opaque panic");
        assert!(config.guard.log_panics);
        std::env::remove_var("TEST_DAGRUN_OPAQUE");
    }

    #[test]
    fn test_load_missing_file() {
        let err = DagrunConfig::load(Path::new("/nonexistent/dagrun.toml")).unwrap_err();
        assert!(matches!(err, DagrunError::ConfigNotFound(_)));
    }
}

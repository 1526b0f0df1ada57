//! Secret reference resolver.
//!
//! Values in `config.toml` can use special prefixes to reference secrets
//! stored outside the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - anything else is returned as-is (plain text)

use std::io;
use std::process::Command;

use thiserror::Error;

/// A secret reference that could not be resolved.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: String,
        stderr: String,
    },

    #[error("`pass show {path}` produced no output")]
    PassEmpty { path: String },

    #[error("environment variable `{var}` is not set")]
    EnvMissing { var: String },
}

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

/// Returns true if the value is a `pass::` or `env::` reference.
pub fn is_reference(value: &str) -> bool {
    value.starts_with("pass::") || value.starts_with("env::")
}

fn resolve_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty {
            path: path.to_string(),
        })
}

fn resolve_env(var: &str) -> Result<String, SecretError> {
    std::env::var(var).map_err(|_| SecretError::EnvMissing {
        var: var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hello").unwrap(), "hello");
        assert_eq!(resolve("").unwrap(), "");
        assert!(!is_reference("xxx.apps.googleusercontent.com"));
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_SHIFTCAL_TEST_SECRET", "my-secret-value");
        }
        assert!(is_reference("env::_SHIFTCAL_TEST_SECRET"));
        assert_eq!(
            resolve("env::_SHIFTCAL_TEST_SECRET").unwrap(),
            "my-secret-value"
        );
        unsafe {
            std::env::remove_var("_SHIFTCAL_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_SHIFTCAL_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(matches!(err, SecretError::EnvMissing { .. }));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::nonexistent/entry/that/should/not/exist/12345").is_err());
    }
}

//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate()?;

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        if google.client_id.is_some() || google.client_secret.is_some() {
            println!("Google credentials are valid.");
        }
        if google
            .client_secret
            .as_deref()
            .is_some_and(|secret| !crate::secret::is_reference(secret))
        {
            println!("note: client_secret is stored in plain text; 'env::' and 'pass::' references are supported.");
        }
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

//! Subcommand implementations.

#[cfg(feature = "google")]
pub mod auth;
pub mod config;
pub mod import;
pub mod roster;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use shiftcal_core::RosterTable;
use shiftcal_providers::{CalendarAccess, ErrorProvider, ProviderError};
use shiftcal_server::extractor_for_path;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Reads a roster file into a table, picking the format from its extension.
pub fn read_roster(path: &Path) -> ClientResult<RosterTable> {
    let extract_error = |source| ClientError::Extract {
        path: path.display().to_string(),
        source,
    };

    let extractor = extractor_for_path(path).map_err(extract_error)?;
    let data = std::fs::read(path)?;
    let table = extractor.extract(&data).map_err(extract_error)?;
    debug!(
        path = %path.display(),
        format = extractor.name(),
        rows = table.row_count(),
        "read roster"
    );
    Ok(table)
}

/// Builds the configured calendar provider.
#[cfg(feature = "google")]
pub fn calendar_provider(config: &ClientConfig) -> ClientResult<Arc<dyn CalendarAccess>> {
    use shiftcal_providers::google::GoogleProvider;

    let settings = config.google.clone().unwrap_or_default();
    let provider = GoogleProvider::new(settings.to_provider_config()?)?;
    Ok(Arc::new(provider))
}

/// Builds the configured calendar provider.
#[cfg(not(feature = "google"))]
pub fn calendar_provider(_config: &ClientConfig) -> ClientResult<Arc<dyn CalendarAccess>> {
    Err(ClientError::config(
        "shiftcal was built without a calendar provider",
    ))
}

/// Like [`calendar_provider`], but a broken configuration yields a provider
/// that reports the problem on every call.
pub fn provider_or_error(config: &ClientConfig) -> Arc<dyn CalendarAccess> {
    match calendar_provider(config) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "calendar provider unavailable");
            Arc::new(ErrorProvider::new(
                "google",
                ProviderError::configuration(e.to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftcal_core::ColumnIndex;

    #[test]
    fn reads_csv_rosters() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plan.CSV");
        std::fs::write(&path, "Jan 24\n,,1,2\nAlice,,K00,X\n").unwrap();

        let table = read_roster(&path).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(2, ColumnIndex(2)), Some("K00"));
    }

    #[test]
    fn unknown_extension_names_the_file() {
        let err = read_roster(Path::new("plan.xlsx")).unwrap_err();
        assert!(matches!(err, ClientError::Extract { .. }));
        assert!(err.to_string().contains("plan.xlsx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_roster(Path::new("/nonexistent/plan.csv")).unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn broken_provider_config_still_yields_a_provider() {
        let config = ClientConfig::parse("[google]\nclient_id = \"bad\"\nclient_secret = \"s\"\n")
            .unwrap();
        let provider = provider_or_error(&config);
        assert!(!provider.is_authenticated());
    }
}

//! Upload server command.

use std::net::SocketAddr;

use shiftcal_server::{AppState, Pipeline, SessionStore};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Run the HTTP upload server until Ctrl-C.
///
/// A provider that cannot be configured does not stop the server; its
/// calls fail and the browser sees the reason.
pub async fn run(config: &ClientConfig, bind: Option<SocketAddr>) -> ClientResult<()> {
    let server_config = config.server.to_server_config(bind);
    let provider = super::provider_or_error(config);
    info!(
        provider = provider.name(),
        authenticated = provider.is_authenticated(),
        max_upload_bytes = server_config.max_upload_bytes,
        "starting upload server"
    );

    let pipeline = Pipeline::new(provider, config.roster.event_builder());
    let state = AppState::new(pipeline, SessionStore::new(server_config.session_ttl));

    println!("Listening on http://{}", server_config.bind);
    shiftcal_server::serve(&server_config, state).await?;
    Ok(())
}

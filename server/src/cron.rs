use std::time::Duration;

use cja::{cron::CronRegistry, server::session::DBSession};

use crate::AppState;

fn one_hour() -> Duration {
    Duration::from_secs(60 * 60)
}

#[derive(Debug, thiserror::Error)]
#[error("{0:?}")]
pub(crate) struct CronError(color_eyre::Report);

pub(crate) fn register(registry: &mut CronRegistry<AppState>) {
    registry.register::<CronError>("ExpireSessions", one_hour(), |app_state, _context| {
        Box::pin(expire_sessions(app_state))
    });
}

#[tracing::instrument(skip_all, err)]
async fn expire_sessions(app_state: AppState) -> Result<(), CronError> {
    let deleted = DBSession::delete_expired(&app_state.db, app_state.app.session_ttl())
        .await
        .map_err(CronError)?;

    tracing::info!(deleted, "Expired old sessions");

    Ok(())
}

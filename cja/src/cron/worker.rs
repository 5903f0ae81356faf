use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};

use crate::app_state::AppState as AS;

use super::registry::{CronRegistry, TickError};

pub struct Worker<AppState: AS> {
    state: AppState,
    registry: CronRegistry<AppState>,
}

impl<AppState: AS> Worker<AppState> {
    pub fn new(state: AppState, registry: CronRegistry<AppState>) -> Self {
        Self { state, registry }
    }

    /// Runs forever. A failed tick is logged and retried on the next pass.
    pub async fn run(self) {
        let worker_id = uuid::Uuid::new_v4();

        tracing::debug!("Starting cron loop");
        loop {
            if let Err(error) = self.tick(&worker_id).await {
                tracing::error!(%error, "Cron tick failed");
            }

            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    #[tracing::instrument(name = "cron.tick", skip_all, fields(cron_worker.id = %worker_id))]
    pub async fn tick(&self, worker_id: &uuid::Uuid) -> Result<(), TickError> {
        let last_runs = self.last_runs().await?;

        for (name, job) in &self.registry.jobs {
            if let Err(error) = job.tick(self.state.clone(), &last_runs).await {
                tracing::error!(cron_job.name = name, %error, "Cron job failed");
            }
        }

        Ok(())
    }

    async fn last_runs(&self) -> Result<HashMap<String, DateTime<Utc>>, TickError> {
        let rows: Vec<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT name, last_run_at FROM Crons")
                .fetch_all(self.state.db())
                .await?;

        Ok(rows.into_iter().collect())
    }
}

use std::{collections::HashMap, error::Error, future::Future, pin::Pin, time::Duration};

use chrono::{DateTime, OutOfRangeError, Utc};

use crate::app_state::AppState as AS;

pub struct CronRegistry<AppState: AS> {
    pub(super) jobs: HashMap<&'static str, CronJob<AppState>>,
}

#[async_trait::async_trait]
pub trait CronFn<AppState: AS> {
    // Errors are collapsed to a string, the worker only logs them.
    async fn run(&self, app_state: AppState, context: String) -> Result<(), String>;
}

pub struct CronFnClosure<
    AppState: AS,
    FnError: Error + Send + Sync + 'static,
    F: Fn(AppState, String) -> Pin<Box<dyn Future<Output = Result<(), FnError>> + Send>>
        + Send
        + Sync
        + 'static,
> {
    pub(super) func: F,
    _marker: std::marker::PhantomData<AppState>,
}

#[async_trait::async_trait]
impl<
        AppState: AS,
        FnError: Error + Send + Sync + 'static,
        F: Fn(AppState, String) -> Pin<Box<dyn Future<Output = Result<(), FnError>> + Send>>
            + Send
            + Sync
            + 'static,
    > CronFn<AppState> for CronFnClosure<AppState, FnError, F>
{
    async fn run(&self, app_state: AppState, context: String) -> Result<(), String> {
        (self.func)(app_state, context)
            .await
            .map_err(|err| format!("{err:?}"))
    }
}

pub(super) struct CronJob<AppState: AS> {
    name: &'static str,
    func: Box<dyn CronFn<AppState> + Send + Sync + 'static>,
    interval: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("cron job failed: {0}")]
    JobError(String),
    #[error("cron bookkeeping failed: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("cron clock went backwards: {0}")]
    NegativeDuration(#[from] OutOfRangeError),
}

impl<AppState: AS> CronJob<AppState> {
    pub(super) fn is_due(
        &self,
        now: DateTime<Utc>,
        last_runs: &HashMap<String, DateTime<Utc>>,
    ) -> Result<bool, TickError> {
        let Some(last_run) = last_runs.get(self.name) else {
            return Ok(true);
        };

        let elapsed = (now - *last_run).to_std()?;

        Ok(elapsed > self.interval)
    }

    #[tracing::instrument(
        name = "cron_job.tick",
        skip_all,
        fields(
            cron_job.name = self.name,
            cron_job.interval = ?self.interval
        )
    )]
    pub(super) async fn tick(
        &self,
        app_state: AppState,
        last_runs: &HashMap<String, DateTime<Utc>>,
    ) -> Result<(), TickError> {
        let now = Utc::now();

        if !self.is_due(now, last_runs)? {
            return Ok(());
        }

        tracing::info!(task_name = self.name, "Running cron job");

        let context = format!("Cron@{}", app_state.version());
        (self.func)
            .run(app_state.clone(), context)
            .await
            .map_err(TickError::JobError)?;

        sqlx::query(
            "INSERT INTO Crons (cron_id, name, last_run_at)
            VALUES (?, ?, ?)
            ON CONFLICT (name)
            DO UPDATE SET
                last_run_at = excluded.last_run_at,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(self.name)
        .bind(now)
        .execute(app_state.db())
        .await?;

        Ok(())
    }
}

impl<AppState: AS> CronRegistry<AppState> {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
        }
    }

    #[tracing::instrument(name = "cron.register", skip_all, fields(cron_job.name = name, cron_job.interval = ?interval))]
    pub fn register<FnError: Error + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        interval: Duration,
        job: impl Fn(AppState, String) -> Pin<Box<dyn Future<Output = Result<(), FnError>> + Send>>
            + Send
            + Sync
            + 'static,
    ) {
        let cron_job = CronJob {
            name,
            func: Box::new(CronFnClosure {
                func: job,
                _marker: std::marker::PhantomData,
            }),
            interval,
        };
        self.jobs.insert(name, cron_job);
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.jobs.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<AppState: AS> Default for CronRegistry<AppState> {
    fn default() -> Self {
        Self::new()
    }
}

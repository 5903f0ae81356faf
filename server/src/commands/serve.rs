use cja::{
    cron::{CronRegistry, Worker},
    server::run_server,
};

use crate::{cron, http_server::routes::make_router, AppState, Result};

pub(crate) async fn serve() -> Result<()> {
    let app_state = AppState::from_env().await?;

    let routes = make_router().with_state(app_state.clone());

    let mut registry = CronRegistry::new();
    cron::register(&mut registry);
    let worker = Worker::new(app_state, registry);

    tracing::info!("Spawning Tasks");
    let server_future = tokio::spawn(run_server(routes));
    let cron_future = tokio::spawn(worker.run());
    tracing::info!("Tasks Spawned");

    let (server_result, ()) = tokio::try_join!(server_future, cron_future)?;

    server_result?;

    tracing::info!("Main Returning");

    Ok(())
}

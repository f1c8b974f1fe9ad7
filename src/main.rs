use std::sync::Arc;

use hrms_db::database::supervisor::{ProcessExit, supervise};
use hrms_db::database::{ConnectionSettings, Database, FatalSignal, LoggingObserver, Shutdown};
use hrms_db::utils::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let settings = ConnectionSettings::from_env()?;
    let (fatal, monitor) = FatalSignal::channel();
    let database = Database::connect_lazy(&settings, Arc::new(LoggingObserver::new(fatal)))?;

    // Checking one connection out confirms the credentials before anything
    // else relies on the pool.
    if let Err(error) = database.pool().acquire().await {
        tracing::error!(%error, "could not reach the database");
        database.close().await;
        return Err(error.into());
    }

    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    if supervise(monitor, shutdown, &ProcessExit).await == Shutdown::Requested {
        database.close().await;
    }
    Ok(())
}

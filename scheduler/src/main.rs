use energy_scheduler::{
    config::{ConfigError, load_config},
    controller::Scheduler,
    framework::{Framework, Registry},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = load_config()?;
    let framework = Framework::new(&Registry::in_tree(), &config.profile)?;

    tracing::info!(apiserver=%config.apiserver, "energy-scheduler ready");
    Scheduler::run(config.apiserver, framework).await;
    Ok(())
}

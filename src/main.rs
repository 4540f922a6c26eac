use particle_backdrop::{window, BackdropConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Particle Backdrop v{}", env!("CARGO_PKG_VERSION"));

    // Optional config file as the first argument
    let mut config = match std::env::args().nth(1) {
        Some(path) => BackdropConfig::from_toml_file(&path)?,
        None => BackdropConfig::default(),
    };
    config.apply_env_overrides();

    window::run(config)?;
    Ok(())
}

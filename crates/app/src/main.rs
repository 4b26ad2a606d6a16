use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let (settings, fresh_install) = config::load_settings_or_default();
    if fresh_install {
        // Write defaults so there is a file to put the API key in
        config::save_settings(&settings);
    }

    let filter = EnvFilter::try_from_env("MOCKUP_STUDIO_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if fresh_install {
        if let Some(path) = config::config_path() {
            tracing::info!(path = %path.display(), "Created default settings");
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::run(cli, settings))
}

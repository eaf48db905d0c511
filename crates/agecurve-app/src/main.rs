// agecurve entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only the tables)
// 2. Resolve the base directory from the first argument
// 3. Load config, bootstrapping it from defaults if missing
// 4. Run every report

use agecurve_core::config;

use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let base_dir = match std::env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    info!("agecurve starting in {}", base_dir.display());

    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: {} reports, age convention {:?}",
        config.reports.len(),
        config.age_convention
    );

    let output = agecurve_app::run(&config, &base_dir)?;
    if let Some(json) = &output.json {
        info!("Summary written to {}", json.display());
    }

    Ok(())
}

/// Initialize tracing to log to stderr.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agecurve=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

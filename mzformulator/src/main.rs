use std::fs;
use std::io;
use std::path::Path;

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mzformulator::{MZFormulator, MZFormulatorError};

fn configure_log(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, MZFormulatorError> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(fs::File::create(path)?);
            let layer = fmt::layer()
                .compact()
                .with_ansi(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_writer(writer)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(tracing::Level::DEBUG.into())
                        .from_env_lossy(),
                );
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer().compact().with_writer(io::stderr).with_filter(
                EnvFilter::builder()
                    .with_default_directive(tracing::Level::INFO.into())
                    .from_env_lossy(),
            ),
        )
        .with(file_layer)
        .init();
    Ok(guard)
}

fn main() -> Result<(), MZFormulatorError> {
    let args = MZFormulator::parse();

    let mut config = Figment::new().merge(Toml::file("mzformulator.toml"));
    if let Some(path) = args.config_file.clone() {
        config = config.merge(Toml::file_exact(path));
    }
    let config = config
        .merge(Env::prefixed("MZFORMULATOR_"))
        .merge(Serialized::defaults(args));
    let driver: MZFormulator = config.extract()?;

    let _log_guard = configure_log(driver.log_file.as_deref())?;
    driver.main()
}

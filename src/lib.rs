pub mod app;
pub mod capture;
mod config;
pub mod error;
pub mod logging;
pub mod notification;
pub mod page;
pub mod profile;
pub mod render;
pub mod settings;
pub mod state;
pub mod storage;
#[cfg(test)]
mod testing;
pub mod workflow;

pub use config::{load_app_config, AppConfig};
pub use error::{AppError, AppResult};

/// Entrypoint used by the command-line binary.
pub fn run<I>(args: I) -> AppResult<()>
where
    I: IntoIterator<Item = String>,
{
    logging::init();

    let command = app::parse_command(args)?;
    let config = load_app_config();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut app = app::App::from_config(&config)?;
    tracing::info!(?command, "starting keepsake");

    let report = runtime.block_on(app.execute(command));
    println!("{report}");
    app.flush_notifications();

    tracing::info!(photo_state = ?app.page().photo_state(), "command complete");
    Ok(())
}

//! Terminal demo: prints the clock hands on every boundary redraw.
//!
//! Usage: `clockface-demo [CONFIG_PATH]`. Without a path the default config
//! location is used when it exists, otherwise built-in defaults.
//!
//! Hand positions go to stdout; tracing goes to stderr (`RUST_LOG` applies).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clockface::render::TerminalRenderer;
use clockface::{
    ClockController, ClockHandle, ClockSettings, HostVisibility, MountPoint, SystemClock,
    visibility_channel,
};
use tokio_util::sync::CancellationToken;

/// How often the demo checks whether it has seen enough redraws.
const PROGRESS_POLL: Duration = Duration::from_millis(250);

/// How long a hidden-start demo stays hidden before it is shown.
const HIDDEN_FOR: Duration = Duration::from_secs(3);

fn load_settings() -> anyhow::Result<ClockSettings> {
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let path = explicit.clone().unwrap_or_else(ClockSettings::default_config_path);
    if explicit.is_some() || path.exists() {
        tracing::info!(path = %path.display(), "loading clock settings");
        return ClockSettings::from_file(&path)
            .with_context(|| format!("cannot load {}", path.display()));
    }
    Ok(ClockSettings::default())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let initial = if settings.demo.start_hidden {
        HostVisibility::Hidden
    } else {
        HostVisibility::Visible
    };
    let (visibility, source) = visibility_channel(initial);

    let controller = ClockController::new(
        MountPoint::new("terminal"),
        settings.clock.clone(),
        TerminalRenderer::new(std::io::stdout()),
        &source,
        SystemClock,
    )
    .context("failed to mount clock")?;

    let cancel = CancellationToken::new();
    let handle = ClockHandle::spawn_with_cancel(controller, cancel.clone());
    tracing::info!(
        mode = %settings.clock.display_mode,
        redraws = settings.demo.redraws,
        "clockface demo running"
    );

    if settings.demo.start_hidden {
        tokio::time::sleep(HIDDEN_FOR).await;
        visibility.show();
    }

    let target = u64::from(settings.demo.redraws);
    let mut progress = tokio::time::interval(PROGRESS_POLL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            _ = progress.tick() => {
                let snapshot = handle.snapshot().await.context("clock host loop stopped")?;
                if snapshot.redraws >= target {
                    break;
                }
            }
        }
    }

    handle.destroy().await.context("failed to destroy clock")?;
    let snapshot = handle.snapshot().await.context("clock host loop stopped")?;
    handle.join().await.context("clock host task failed")?;
    tracing::info!(
        redraws = snapshot.redraws,
        faults = snapshot.render_faults,
        "clockface demo finished"
    );
    Ok(())
}

//! Logging setup and the client run loop.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use devlink_config::{Config, ConfigLoader, LoggingConfig};
use devlink_core::{
    resolve_root, EndpointSet, HttpAuthProbe, LinkClient, NotificationBoard, ReloadRequest,
    ReloadScheduler, SessionTiming, WsConnector,
};

use crate::console;

/// Initialize tracing with console and file output.
///
/// Log files go to `logging.log_dir` with daily rotation. `RUST_LOG`
/// overrides `logging.level`. Console output goes to stderr so stdout only
/// carries device frames.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = PathBuf::from(ConfigLoader::expand_path(&logging.log_dir));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("devlink")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn timing(config: &Config) -> SessionTiming {
    SessionTiming {
        keepalive_interval: config.session.keepalive_interval(),
        reload_delay: config.session.reload_delay(),
    }
}

/// Print the endpoint set for the configured location.
pub(crate) fn print_endpoints(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let location = Url::parse(&config.device.location)?;
    let root = resolve_root(&location)?;
    let endpoints = EndpointSet::resolve(&root)?;

    println!("root:    {}", root);
    println!("{}", endpoints);
    Ok(())
}

/// Why one client lifetime ended.
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Reload,
    Quit,
}

/// Serve one client: forward console lines until a reload is due, input
/// ends, or `shutdown` completes.
///
/// `shutdown` is owned by the caller and outlives the client.
async fn drive_client<R, S>(
    client: &LinkClient,
    reloads: &mut mpsc::UnboundedReceiver<ReloadRequest>,
    lines: &mut Lines<R>,
    shutdown: &mut Pin<&mut S>,
) -> Exit
where
    R: AsyncBufRead + Unpin,
    S: Future,
{
    loop {
        tokio::select! {
            Some(request) = reloads.recv() => {
                info!("Reload due after {:?}", request.delay);
                return Exit::Reload;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => console::dispatch(client.bridge(), &line),
                Ok(None) => return Exit::Quit,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    return Exit::Quit;
                }
            },
            _ = shutdown.as_mut() => return Exit::Quit,
        }
    }
}

/// Run the client until stdin closes or Ctrl+C.
///
/// A failed handshake schedules a reload; the whole client is then dropped
/// and rebuilt from the configuration, the same way a page reload would.
pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let location = Url::parse(&config.device.location)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut attempt: u64 = 0;

    // One listener for the whole run, so a Ctrl+C between polls is not lost
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        attempt += 1;
        info!("Starting client #{} for {}", attempt, location);

        let (reloader, mut reloads) = ReloadScheduler::new();
        let client = LinkClient::new(
            location.clone(),
            Arc::new(WsConnector),
            Arc::new(HttpAuthProbe::new()),
            Arc::new(NotificationBoard::stderr()),
            Arc::new(reloader),
            timing(&config),
        )?;

        client.bridge().connect(|text| println!("{}", text))?;

        let exit = drive_client(&client, &mut reloads, &mut lines, &mut shutdown).await;
        drop(client);

        if exit == Exit::Quit {
            info!("Shutting down");
            return Ok(());
        }
    }
}

use anyhow::{bail, Context};
use serde::Serialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tidelink_core::{logging, Config, SystemClock};
use tidelink_router::{
    ChannelDispatcher, Envelope, Forwarder, InMemoryCommandQueue, Medium, Router,
    StaticIdentityResolver,
};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

mod input;

use input::{parse_line, InputLine};

const NODE_PROTOCOL_VERSION: u32 = 1;
const NODE_RUNTIME_VERSION: u32 = 1;
const INPUT_BUFFER_LINES: usize = 256;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    runtime_version: u32,
    protocol_version: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            runtime_version: NODE_RUNTIME_VERSION,
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let config = match parse_config_path(&args)? {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default_config(),
    };
    logging::init_from_config(&config.logging);

    info!(
        node = %config.node.name,
        system_id = config.node.system_id,
        peers = config.peers.len(),
        "Tidelink node starting"
    );

    let (dispatcher, outbound) = ChannelDispatcher::channel();
    let queue = Arc::new(InMemoryCommandQueue::new());
    let router = Arc::new(Router::new(
        &config.router,
        Arc::new(StaticIdentityResolver::from_peers(&config.peers)),
        Arc::new(dispatcher),
        Arc::new(SystemClock),
    ));
    let forwarder = Arc::new(Forwarder::new(router.clone(), queue.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loops = [
        (Medium::Acoustic, config.forwarder.acoustic_interval_secs),
        (Medium::Wireless, config.forwarder.wireless_interval_secs),
    ]
    .map(|(medium, secs)| {
        tokio::spawn(forwarder.clone().run(
            medium,
            Duration::from_secs(secs),
            shutdown_rx.clone(),
        ))
    });
    let printer = tokio::spawn(print_envelopes(outbound));
    let input = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));

    tokio::select! {
        result = read_input(input, router.clone(), queue) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    let _ = shutdown_tx.send(true);
    for handle in loops {
        handle.await?;
    }
    // The printer ends once every dispatcher clone is gone.
    drop(forwarder);
    drop(router);
    printer.await?;

    info!("Tidelink node stopped");
    Ok(())
}

/// Read lines from `reader` on a plain OS thread.
///
/// The thread is detached: on Ctrl-C the process exits without waiting
/// for a read that may never return. The channel closes on EOF.
fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_BUFFER_LINES);
    thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Feed input lines into the router until the reader hits EOF.
async fn read_input(
    mut lines: mpsc::Receiver<std::io::Result<String>>,
    router: Arc<Router>,
    queue: Arc<InMemoryCommandQueue>,
) -> anyhow::Result<()> {
    while let Some(line) = lines.recv().await {
        let line = line.context("reading input")?;
        match parse_line(&line) {
            None => {}
            Some(Err(e)) => warn!(error = %e, "Ignoring malformed input line"),
            Some(Ok(InputLine::Enqueue { enqueue })) => {
                queue.enqueue(enqueue.destination, enqueue.payload.into_bytes());
            }
            Some(Ok(InputLine::Observation(observation))) => {
                if let Err(e) = router.process(observation) {
                    warn!(error = %e, "Observation rejected");
                }
            }
        }
    }
    info!(status = ?router.status(), "Input closed");
    Ok(())
}

/// Write every dispatched envelope to stdout as one JSON line.
async fn print_envelopes(mut outbound: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = outbound.recv().await {
        match serde_json::to_string(&envelope) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "Failed to encode envelope"),
        }
    }
}

fn parse_config_path(args: &[String]) -> anyhow::Result<Option<PathBuf>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(Some(PathBuf::from(path)));
            }
            bail!("--config was provided without a path");
        }
    }
    Ok(None)
}

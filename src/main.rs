use clap::Parser;
use miniroute::error::ConfigError;
use miniroute::lifecycle;
use miniroute::net::dispatcher;
use miniroute::node::Node;
use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

/// A miniature distance-vector routing daemon over UDP.
///
/// With only `port`, runs as a routing node. With `src_label` and
/// `dst_label` also given, runs as a one-shot traffic injector instead.
#[derive(Debug, Parser)]
#[command(name = "miniroute")]
struct Args {
    /// Port to bind (routing node mode) or to bind the injector's own
    /// transient socket (injector mode).
    port: u16,

    /// Entry-point label for injector mode.
    src_label: Option<char>,

    /// Destination label for injector mode.
    dst_label: Option<char>,

    /// Path to the topology file.
    #[arg(long, default_value = "sample_topology.txt")]
    topology: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("miniroute=info")),
        )
        .init();

    let args = Args::parse();

    let result = match (args.src_label, args.dst_label) {
        (Some(src), Some(dst)) => run_injector(&args.topology, args.port, src, dst).await,
        (None, None) => run_node(&args.topology, args.port).await,
        _ => {
            tracing::error!("injector mode requires both src_label and dst_label");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run_node(topology: &PathBuf, port: u16) -> Result<(), ConfigError> {
    let mut node = Node::bootstrap(topology, port, std::path::Path::new(".")).await?;
    tracing::info!(label = %node.label, port, "node bootstrapped");

    lifecycle::announce_startup(&node).await;

    let mut buf = vec![0u8; 65536];
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
            recv = node.socket.recv_from(&mut buf) => {
                match recv {
                    Ok((len, from)) => {
                        dispatcher::dispatch(&mut node, from.port(), &buf[..len]).await;
                    }
                    Err(err) => {
                        tracing::error!(%err, "socket receive error");
                    }
                }
            }
        }
    }

    lifecycle::announce_shutdown(&node).await;
    Ok(())
}

async fn run_injector(topology: &PathBuf, port: u16, src: char, dst: char) -> Result<(), ConfigError> {
    print!("Enter payload (up to 80 characters): ");
    io::stdout().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(ConfigError::Io)?;
    let payload = line.trim_end_matches(['\n', '\r']).as_bytes();

    miniroute::injector::inject(topology, port, src, dst, payload).await
}

//! fsevent-client - print batches of filesystem changes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fsevent_client::config::{ClientConfig, ConfigLoader};
use fsevent_client::display;
use fsevent_client::session::WatcherSession;
use fsevent_client::stream::NumberParsing;

#[derive(Parser)]
#[command(
    name = "fsevent-client",
    about = "Watch paths and print batches of filesystem changes",
    version
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Paths to watch.
    #[arg(required = true)]
    paths: Vec<String>,

    /// Resume from this event id.
    #[arg(long)]
    since_when: Option<String>,

    /// Coalescing latency in seconds.
    #[arg(long)]
    latency: Option<f64>,

    /// Deliver the first event without waiting for the latency window.
    #[arg(long)]
    no_defer: bool,

    /// Also report moves of the watched roots.
    #[arg(long)]
    watch_root: bool,

    /// Report individual files, not only directories.
    #[arg(long)]
    file: bool,

    /// Print event ids and flags with each path.
    #[arg(long)]
    flags: bool,

    /// Skip lines whose numeric fields are not plain integers.
    #[arg(long)]
    strict: bool,

    /// Print each batch as a JSON array.
    #[arg(long)]
    json: bool,

    /// Watcher executable (overrides the config file).
    #[arg(long)]
    executable: Option<PathBuf>,

    /// Config file path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layer command-line flags over the loaded config.
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(executable) = &self.executable {
            config.executable = Some(executable.clone());
        }
        if let Some(token) = &self.since_when {
            config.options.since_when = Some(token.clone());
        }
        if let Some(latency) = self.latency {
            config.options.latency = Some(latency);
        }
        config.options.no_defer |= self.no_defer;
        config.options.watch_root |= self.watch_root;
        config.options.file |= self.file;
        config.options.use_flags_and_id |= self.flags;
        if self.strict {
            config.numbers = NumberParsing::Strict;
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    let session_config = match config.session_config(cli.paths.iter().cloned()) {
        Ok(session_config) => session_config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if !cli.json {
        display::print_session_start(session_config.executable(), session_config.paths());
    }

    let print = if cli.json {
        display::print_batch_json
    } else {
        display::print_batch
    };
    let mut session = match WatcherSession::new(session_config, print) {
        Ok(session) => session,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = session.run().await {
        display::print_error(&e.to_string());
        return ExitCode::FAILURE;
    }

    if !cli.json {
        display::print_session_end(session.stats());
    }
    ExitCode::SUCCESS
}

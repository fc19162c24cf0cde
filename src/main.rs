use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use ua_normalizer::{batch, builtin, server, Aggregator, Config, Result};

#[derive(Parser, Debug)]
#[command(name = "ua-normalizer", version, about = "Compare User-Agent parsing backends side by side")]
struct Cli {
    #[arg(short, long, env = "UA_NORMALIZER_CONFIG", default_value = "ua-normalizer.toml")]
    config: PathBuf,

    /// Load detector rules from a device-detector `regexes/` checkout.
    #[arg(long, global = true)]
    regexes_dir: Option<PathBuf>,

    /// -v for debug, -vv for trace. RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Echo every request with each backend's report for its User-Agent
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write reports for a list of UAs to a file
    Dump {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the report for one UA
    Parse { ua: String },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config)?;
    if cli.regexes_dir.is_some() {
        config.regexes_dir = cli.regexes_dir;
    }

    let registry = match &config.regexes_dir {
        Some(dir) => builtin::registry_with_regexes(dir),
        None => builtin::registry(),
    };
    let aggregator = Aggregator::with_backends(&registry, &config.backend_kinds()?);

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config.server.addr()?, Arc::new(aggregator)).await
        }
        Command::Dump { input, output } => {
            let input = input.or(config.batch.input);
            let output = output.unwrap_or(config.batch.output);
            let uas = batch::read_input(input.as_deref(), &config.batch.inline)?;
            batch::dump(&aggregator, &uas, &output)?;
            Ok(())
        }
        Command::Parse { ua } => {
            print!("{}", aggregator.render(&ua));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

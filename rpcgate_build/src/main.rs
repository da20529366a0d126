//! `rpcgate` command: generates the gateway switcher of a service.
use std::{path::PathBuf, process};

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use rpcgate_build::{Convention, Generator};


#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// RPC convention of the service (grpc|thrift)
    #[arg(long)]
    pub rpc_type: Convention,
    /// Directory holding the service configuration and IDL files
    #[arg(long)]
    pub service_root: PathBuf,
    /// Configuration file name, without `.yaml` extension
    #[arg(long, default_value = "service")]
    pub config: String,
    /// Extra arguments of the stub compiler
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub options: String,
    /// Don't run the stub compiler, use stubs already in `gen/`
    #[arg(long)]
    pub skip_stub: bool,
    /// Run rustfmt on the generated switcher
    #[arg(long)]
    pub format: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy()
        )
        .with_target(false)
        .init();

    let generator = Generator {
        config_name: cli.config,
        options: cli.options,
        run_stub_compiler: !cli.skip_stub,
        format: cli.format,
        ..Generator::new(cli.rpc_type, cli.service_root)
    };

    match generator.generate() {
        Ok(path) => info!(path = %path.display(), "generation done"),
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    }
}

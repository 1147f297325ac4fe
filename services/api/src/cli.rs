use crate::admin::{run_requests_command, RequestsCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use docdesk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Document Request Desk",
    about = "Serve and administer document requests from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect, approve, or reject stored document requests
    Requests {
        #[command(subcommand)]
        command: RequestsCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Requests { command } => run_requests_command(command).await,
    }
}

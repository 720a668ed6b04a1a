use crate::demo::{run_candidate_validation, run_demo, CandidateCsvArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use intern_hub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Intern Hub",
    about = "Run the internship hiring pipeline service or exercise it from the command line",
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
    /// Work with candidate bulk-upload files
    Candidates {
        #[command(subcommand)]
        command: CandidatesCommand,
    },
    /// Walk a synthetic cohort from intake through offer acceptance
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CandidatesCommand {
    /// Validate a candidate CSV without registering anyone
    Validate(CandidateCsvArgs),
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
        Command::Candidates {
            command: CandidatesCommand::Validate(args),
        } => run_candidate_validation(args),
        Command::Demo(args) => run_demo(args),
    }
}

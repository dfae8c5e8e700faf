use crate::demo::{
    run_allocation, run_business_days, run_demo, AllocationArgs, BusinessDaysArgs, DemoArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use leave_ledger::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Leave Ledger",
    about = "Run the leave allocation and approval service, or explore it from the command line",
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
    /// Show the annual entitlement breakdown for a hire date
    Allocation(AllocationArgs),
    /// Count working days in an inclusive date range
    BusinessDays(BusinessDaysArgs),
    /// Run an end-to-end demo: seed balances, submit, approve and reject requests
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Holiday calendar CSV used when a payload carries no holidays
    #[arg(long)]
    pub(crate) holidays_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Allocation(args) => run_allocation(args),
        Command::BusinessDays(args) => run_business_days(args),
        Command::Demo(args) => run_demo(args),
    }
}

use clap::Parser;
use daprctl::cmd::{self, AddonCommand, Cli, Command};
use daprctl::error::DaprctlError;
use std::process::{ExitCode, Termination};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => e.report(),
    }
}

async fn run(command: Command) -> Result<(), DaprctlError> {
    match command {
        #[cfg(feature = "arm")]
        Command::Binding(cmd::BindingCommand::Provision(args)) => {
            cmd::provision((*args).load()?).await
        }
        Command::Addon(AddonCommand::Create(args)) => cmd::create((*args).load()?),
        Command::Addon(AddonCommand::Update(args)) => cmd::update((*args).load()?),
    }
}

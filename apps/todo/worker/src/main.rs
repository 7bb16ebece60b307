use clap::Parser;
use core_config::tracing::install_color_eyre;
use todo_worker::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    let cli = Cli::parse();
    todo_worker::run(cli.command).await
}

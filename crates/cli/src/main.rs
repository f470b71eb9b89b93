use clap::Parser;
use pharmassist_cli::{config_from_env, init_tracing, Client, Commands};

#[derive(Parser)]
#[command(name = "pharmassist")]
#[command(about = "PharmAssist prescription dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'pharmassist --help' for commands");
        return Ok(());
    };

    let client = Client::from_config(config_from_env()?)?;
    client.dashboard().start().await;

    if let Err(e) = command.execute(&client).await {
        tracing::debug!("command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

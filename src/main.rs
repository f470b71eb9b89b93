use pharmassist_cli::shell::{ShellInput, help, parse_line};
use pharmassist_cli::{Client, config_from_env, init_tracing};
use pharmassist_core::SessionState;
use std::io::{self, BufRead, Write};

/// Main entry point for the PharmAssist dashboard shell
///
/// Restores the previous session, then reads dashboard commands from stdin
/// one line at a time until `quit`, `exit` or end of input. Words may be
/// grouped with double quotes.
///
/// # Environment Variables
/// - `PHARMASSIST_DATA_SOURCE`: `local` or `remote` (default: remote when an API URL is set)
/// - `PHARMASSIST_API_URL`: Device base URL (default: "http://192.168.4.1")
/// - `PHARMASSIST_STATE_FILE`: Persisted client state (default: ".pharmassist/state.json")
/// - `PHARMASSIST_REQUEST_TIMEOUT_SECS`: Request timeout in seconds (default: 10)
///
/// # Returns
/// * `Ok(())` - When the user leaves the shell
/// * `Err(anyhow::Error)` - If configuration is invalid or stdin cannot be read
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let client = Client::from_config(config_from_env()?)?;
    tracing::info!("++ Starting PharmAssist dashboard shell");

    match client.dashboard().start().await {
        SessionState::Authenticated(user) => println!("Welcome back, {}", user.name),
        SessionState::Unauthenticated => {
            println!("Not signed in. Use 'login <username|email> <password>'.")
        }
    }
    println!("Type 'help' for commands, 'quit' to leave.");

    let stdin = io::stdin();
    loop {
        print!("pharmassist> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match parse_line(&line) {
            Ok(ShellInput::Blank) => {}
            Ok(ShellInput::Quit) => break,
            Ok(ShellInput::Help) => println!("{}", help()),
            Ok(ShellInput::Run(command)) => {
                if let Err(e) = command.execute(&client).await {
                    tracing::debug!("command failed: {}", e);
                }
            }
            Err(message) => eprintln!("{}", message),
        }
    }

    Ok(())
}

//! Line parsing for the interactive shell.

use crate::commands::Commands;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

/// What one line of shell input asks for.
#[derive(Debug, PartialEq)]
pub enum ShellInput {
    Blank,
    Quit,
    Help,
    Run(Commands),
}

/// Split a line into words. Double quotes group words; a quote inside a word
/// is dropped.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote".into());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse one line of input.
///
/// # Errors
///
/// Returns the message to show for an unknown command or bad arguments.
pub fn parse_line(line: &str) -> Result<ShellInput, String> {
    let words = split_words(line)?;
    match words.first().map(String::as_str) {
        None => Ok(ShellInput::Blank),
        Some("quit" | "exit") => Ok(ShellInput::Quit),
        Some("help" | "?") => Ok(ShellInput::Help),
        Some(_) => ShellLine::try_parse_from(&words)
            .map(|parsed| ShellInput::Run(parsed.command))
            .map_err(|e| e.to_string()),
    }
}

/// Help text listing every command.
pub fn help() -> String {
    use clap::CommandFactory;
    ShellLine::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_with_quotes() {
        assert_eq!(
            split_words(r#"submit --patient "Robert Chen" --med Aspirin:75mg:tablet:28"#).unwrap(),
            ["submit", "--patient", "Robert Chen", "--med", "Aspirin:75mg:tablet:28"]
        );
        assert_eq!(split_words(r#"login "" pw"#).unwrap(), ["login", "", "pw"]);
        assert!(split_words(r#"login "smith"#).is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("").unwrap(), ShellInput::Blank);
        assert_eq!(parse_line("exit").unwrap(), ShellInput::Quit);
        assert_eq!(parse_line("help").unwrap(), ShellInput::Help);
        assert_eq!(
            parse_line("collect RX-2024-003").unwrap(),
            ShellInput::Run(Commands::Collect {
                id: "RX-2024-003".into()
            })
        );
        assert!(parse_line("dispense RX-2024-003").is_err());
    }

    #[test]
    fn test_help_lists_commands() {
        let text = help();
        assert!(text.contains("mark-all-read"));
        assert!(text.contains("related"));
    }
}

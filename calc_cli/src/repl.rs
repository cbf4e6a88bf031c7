//! Command parsing and execution for the interactive prompt.
//!
//! A line holds whitespace-separated tokens. Tokens made only of keypad
//! characters (`0-9 . + - * x / =`) are pressed one key at a time, so
//! `12.5*4=` and `12.5 * 4 =` behave the same. Any other token is a command
//! word; see [`HELP`].

use std::path::PathBuf;
use std::sync::Arc;

use calc_core::calculator::{Calculator, CalculatorApi, Operator};
use calc_core::config::ConfigUpdate;
use calc_core::errors::{CalcError, CalcResult};
use calc_core::file_io::{load_session_with_lock_check, save_session, write_atomic, FileLock};
use calc_core::logger::{CalcLogger, MemoryLogger};
use calc_core::session::Session;

pub const HELP: &str = "\
Keys:      0-9  .  +  -  *  x  /  =     (e.g. `12.5 * 4 =` or `12.5*4=`)
Editing:   c | clear          reset the calculator (history is kept)
           b | back           delete the last character
Display:   $ | usd            show the display as US dollars
           currency CODE      show the display in another currency
           state              print the full engine state as JSON
History:   history            list completed operations, newest first
           clear-history      forget all completed operations
Settings:  config KEY=VALUE   max_digits, decimal_places, enable_history, enable_logging
Files:     save PATH          save config and history to a session file
           load PATH          restore config and history from a session file
           logs               print the log buffer as JSON
           export-logs PATH   write the log buffer to a file
Other:     help | quit";

/// One parsed unit of input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Digit(char),
    Dot,
    Operator(Operator),
    Backspace,
    Clear,
    Currency(String),
    State,
    History,
    ClearHistory,
    Config(ConfigUpdate),
    Save(PathBuf),
    Load(PathBuf),
    Logs,
    ExportLogs(PathBuf),
    Help,
    Quit,
}

/// What the prompt loop should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Keep reading; print the text if any
    Continue(Option<String>),
    Quit,
}

/// Split a line into commands. Stops at the first malformed token.
pub fn parse_line(line: &str) -> CalcResult<Vec<Command>> {
    let mut commands = Vec::new();
    let mut tokens = line.split_whitespace();

    while let Some(token) = tokens.next() {
        if is_keypad_token(token) {
            commands.extend(token.chars().map(key_command));
            continue;
        }

        let mut argument = |name: &str| {
            tokens
                .next()
                .map(str::to_string)
                .ok_or_else(|| CalcError::invalid_input(name, "", "Missing argument"))
        };

        let command = match token.to_ascii_lowercase().as_str() {
            "c" | "clear" => Command::Clear,
            "b" | "back" | "backspace" => Command::Backspace,
            "$" | "usd" => Command::Currency("USD".to_string()),
            "currency" => Command::Currency(argument("currency")?),
            "state" => Command::State,
            "history" => Command::History,
            "clear-history" => Command::ClearHistory,
            "config" => {
                let pair = argument("config")?;
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| CalcError::invalid_input("config", &pair, "Expected KEY=VALUE"))?;
                Command::Config(ConfigUpdate::from_pair(key, value)?)
            }
            "save" => Command::Save(PathBuf::from(argument("save")?)),
            "load" => Command::Load(PathBuf::from(argument("load")?)),
            "logs" => Command::Logs,
            "export-logs" => Command::ExportLogs(PathBuf::from(argument("export-logs")?)),
            "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return Err(CalcError::invalid_input("command", token, "Unknown command, try `help`")),
        };
        commands.push(command);
    }

    Ok(commands)
}

fn is_keypad_token(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || Operator::try_from(c).is_ok())
}

fn key_command(key: char) -> Command {
    match key {
        '.' => Command::Dot,
        digit if digit.is_ascii_digit() => Command::Digit(digit),
        other => match Operator::try_from(other) {
            Ok(op) => Command::Operator(op),
            // Ruled out by is_keypad_token; the engine ignores non-digits
            Err(_) => Command::Digit(other),
        },
    }
}

/// Press a single key on any calculator binding.
pub fn press<C: CalculatorApi>(calc: &mut C, command: &Command) {
    match command {
        Command::Digit(digit) => calc.input_digit(&digit.to_string()),
        Command::Dot => calc.input_dot(),
        Command::Operator(op) => calc.perform_operation(*op),
        Command::Backspace => calc.backspace(),
        Command::Clear => calc.clear(),
        _ => {}
    }
}

/// The calculator plus what the prompt needs around it.
pub struct App {
    pub calc: Calculator,
    logger: Arc<MemoryLogger>,
    user_id: String,
    /// Last session saved or loaded; saves keep its id
    session: Session,
}

impl App {
    pub fn new(calc: Calculator, logger: Arc<MemoryLogger>, user_id: impl Into<String>) -> Self {
        App {
            calc,
            logger,
            user_id: user_id.into(),
            session: Session::default(),
        }
    }

    /// Run one command against the calculator.
    pub fn execute(&mut self, command: Command) -> CalcResult<Outcome> {
        let output = match command {
            Command::Digit(_) | Command::Dot | Command::Operator(_) | Command::Backspace | Command::Clear => {
                press(&mut self.calc, &command);
                None
            }
            Command::Currency(code) => Some(self.calc.get_display_as_currency(&code)),
            Command::State => Some(to_json(&self.calc.get_state())?),
            Command::History => Some(self.format_history()),
            Command::ClearHistory => {
                self.calc.clear_history();
                Some("History cleared".to_string())
            }
            Command::Config(update) => {
                self.calc.update_config(update);
                Some(to_json(self.calc.config())?)
            }
            Command::Save(path) => {
                let _lock = FileLock::acquire(&path, self.user_id.as_str())?;
                self.calc.update_session(&mut self.session);
                save_session(&self.session, &path)?;
                Some(format!("Saved {}", path.display()))
            }
            Command::Load(path) => {
                let (session, lock) = load_session_with_lock_check(&path)?;
                let entries = session.history.len();
                self.session = session.clone();
                self.calc.restore_session(session);
                let mut message = format!("Loaded {} ({} history entries)", path.display(), entries);
                if let Some(lock) = lock {
                    message.push_str(&format!("\nNote: file is in use by {} on {}", lock.user_id, lock.machine));
                }
                Some(message)
            }
            Command::Logs => Some(self.calc.export_logs()),
            Command::ExportLogs(path) => {
                write_atomic(&path, &self.logger.export_logs())?;
                Some(format!("Wrote {} log entries to {}", self.logger.len(), path.display()))
            }
            Command::Help => Some(HELP.to_string()),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Continue(output))
    }

    fn format_history(&self) -> String {
        let history = self.calc.get_history();
        if history.is_empty() {
            return "(no history)".to_string();
        }
        history
            .iter()
            .map(|entry| {
                format!(
                    "{}  {} = {}",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.expression,
                    calc_core::numeric::format_number(entry.result)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> CalcResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CalcError::serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_core::config::CalculatorConfig;
    use calc_core::logger::LoggerConfig;

    fn test_app() -> App {
        let logger = Arc::new(MemoryLogger::new(LoggerConfig {
            mirror_to_tracing: false,
            ..LoggerConfig::default()
        }));
        let calc = Calculator::new(CalculatorConfig::default(), logger.clone());
        App::new(calc, logger, "test")
    }

    fn run(app: &mut App, line: &str) -> Vec<String> {
        parse_line(line)
            .unwrap()
            .into_iter()
            .filter_map(|command| match app.execute(command).unwrap() {
                Outcome::Continue(output) => output,
                Outcome::Quit => None,
            })
            .collect()
    }

    #[test]
    fn test_keypad_tokens_split_into_keys() {
        let commands = parse_line("12.5*4=").unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Digit('1'),
                Command::Digit('2'),
                Command::Dot,
                Command::Digit('5'),
                Command::Operator(Operator::Multiply),
                Command::Digit('4'),
                Command::Operator(Operator::Evaluate),
            ]
        );
    }

    #[test]
    fn test_command_words() {
        assert_eq!(parse_line("C").unwrap(), vec![Command::Clear]);
        assert_eq!(parse_line("$").unwrap(), vec![Command::Currency("USD".to_string())]);
        assert_eq!(parse_line("currency eur").unwrap(), vec![Command::Currency("eur".to_string())]);
        assert_eq!(parse_line("save a.calc").unwrap(), vec![Command::Save(PathBuf::from("a.calc"))]);
        assert_eq!(parse_line("quit").unwrap(), vec![Command::Quit]);
        assert!(parse_line("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("currency").is_err());
        assert!(parse_line("config decimal_places").is_err());
        assert!(parse_line("config colour=blue").is_err());
    }

    #[test]
    fn test_arithmetic_through_prompt() {
        let mut app = test_app();
        run(&mut app, "2 + 3 * 4 =");
        assert_eq!(app.calc.get_display(), "20");

        let output = run(&mut app, "$");
        assert_eq!(output, vec!["$20.00".to_string()]);
    }

    #[test]
    fn test_history_listing() {
        let mut app = test_app();
        assert_eq!(run(&mut app, "history"), vec!["(no history)".to_string()]);

        run(&mut app, "5+3=");
        let output = run(&mut app, "history");
        assert!(output[0].ends_with("5 + 3 = 8"));
    }

    #[test]
    fn test_config_command() {
        let mut app = test_app();
        run(&mut app, "config decimal_places=2");
        run(&mut app, "2/3=");
        assert_eq!(app.calc.get_display(), "0.67");
    }

    #[test]
    fn test_quit_outcome() {
        let mut app = test_app();
        assert_eq!(app.execute(Command::Quit).unwrap(), Outcome::Quit);
    }

    #[test]
    fn test_save_and_load_session() {
        let path = std::env::temp_dir().join("calc_cli_test_session.calc");
        let mut app = test_app();
        run(&mut app, "6*7=");
        run(&mut app, &format!("save {}", path.display()));

        let mut fresh = test_app();
        let output = run(&mut fresh, &format!("load {}", path.display()));
        assert!(output[0].contains("1 history entries"));
        assert_eq!(fresh.calc.get_history()[0].expression, "6 * 7");

        // Saving again keeps the session id
        run(&mut fresh, "2+2=");
        run(&mut fresh, &format!("save {}", path.display()));
        let saved = calc_core::file_io::load_session(&path).unwrap();
        assert_eq!(saved.meta.id, app.session.meta.id);
        assert_eq!(saved.history[0].expression, "2 + 2");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_export_logs() {
        let path = std::env::temp_dir().join("calc_cli_test_logs.json");
        let mut app = test_app();
        run(&mut app, "1/0=");
        run(&mut app, &format!("export-logs {}", path.display()));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Division by zero"));

        let _ = std::fs::remove_file(&path);
    }
}

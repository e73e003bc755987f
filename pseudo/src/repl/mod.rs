//! REPL (Read-Eval-Print Loop) for pseudocode statements

use crate::config::Config;
use crate::error::report_error;
use crate::interp::{evaluate, EvalError, EvalResult, Interpreter, TypePolicy, ValueStore};
use crate::parser::is_statement;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::{self, BufReader, Stdin, Stdout};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".pseudo_history";
const SOURCE_NAME: &str = "<repl>";

type ConsoleInterpreter = Interpreter<BufReader<Stdin>, Stdout>;

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: ConsoleInterpreter,
    policy: TypePolicy,
    color: bool,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: &Config) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let policy = config.type_policy();
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            interpreter: console_interpreter(policy),
            policy,
            color: config.color,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("pseudo REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":vars" | ":v" => {
                match serde_json::to_string_pretty(&self.interpreter.store().snapshot()) {
                    Ok(json) => println!("{json}"),
                    Err(err) => eprintln!("Error: {err}"),
                }
                false
            }
            ":reset" => {
                self.interpreter = console_interpreter(self.policy);
                println!("Store cleared.");
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    /// Print help message
    fn print_help(&self) {
        println!("REPL Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :vars, :v       Show every declared name as JSON");
        println!("  :reset          Forget every declaration");
        println!("  :clear          Clear the screen");
        println!();
        println!("You can enter:");
        println!("  - Declarations: DECLARE n : INTEGER, CONSTANT PI = 3.14");
        println!("  - Arrays: DECLARE marks : ARRAY[1:5] OF REAL");
        println!("  - Assignments: n <- n + 1, marks[2] <- 7.5");
        println!("  - I/O: INPUT n, OUTPUT \"n = \" + n");
        println!("  - Expressions: (2 + 3) * 4, 7 DIV 2, \"Hi \" + name");
    }

    /// Execute a statement, or evaluate and print a bare expression
    fn eval_input(&mut self, input: &str) {
        let result = if is_statement(input) {
            self.interpreter.execute_line(input).map(|_| ())
        } else {
            self.print_value(input)
        };

        if let Err(err) = result {
            self.report(input, &err);
        }
    }

    fn print_value(&self, expression: &str) -> EvalResult<()> {
        let value = evaluate(expression, self.interpreter.store())?;
        println!("{value}");
        Ok(())
    }

    fn report(&self, input: &str, err: &EvalError) {
        if report_error(SOURCE_NAME, input, err, self.color).is_err() {
            eprintln!("Error: {err}");
        }
    }
}

fn console_interpreter(policy: TypePolicy) -> ConsoleInterpreter {
    Interpreter::with_store(ValueStore::with_policy(policy), BufReader::new(io::stdin()), io::stdout())
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Value;

    fn repl() -> Repl {
        Repl::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_handle_command_quit() {
        let mut repl = repl();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(repl.handle_command(":exit"));
    }

    #[test]
    fn test_handle_command_non_quit() {
        let mut repl = repl();
        assert!(!repl.handle_command(":help"));
        assert!(!repl.handle_command(":vars"));
        assert!(!repl.handle_command(":clear"));
        assert!(!repl.handle_command(":unknown"));
    }

    #[test]
    fn test_statements_persist_between_lines() {
        let mut repl = repl();
        repl.eval_input("DECLARE n : INTEGER");
        repl.eval_input("n <- 6 * 7");
        assert_eq!(repl.interpreter.store().get_scalar("n").unwrap(), &Value::Integer(42));
    }

    #[test]
    fn test_failed_line_does_not_stop_repl() {
        let mut repl = repl();
        repl.eval_input("DECLARE n : INTEGER");
        repl.eval_input("n <- \"text\"");
        repl.eval_input("missing + 1");
        repl.eval_input("n <- 1");
        assert_eq!(repl.interpreter.store().get_scalar("n").unwrap(), &Value::Integer(1));
    }

    #[test]
    fn test_reset_clears_store() {
        let mut repl = repl();
        repl.eval_input("DECLARE n : INTEGER");
        assert!(repl.interpreter.store().contains("n"));
        assert!(!repl.handle_command(":reset"));
        assert!(repl.interpreter.store().is_empty());
    }

    #[test]
    fn test_permissive_config_carries_to_store() {
        let config = Config {
            strict_types: false,
            ..Config::default()
        };
        let mut repl = Repl::new(&config).unwrap();
        repl.eval_input("DECLARE n : INTEGER");
        repl.eval_input("n <- \"text\"");
        assert_eq!(repl.interpreter.store().get_scalar("n").unwrap(), &Value::Str("text".into()));
        repl.handle_command(":reset");
        assert_eq!(repl.interpreter.store().policy(), TypePolicy::Permissive);
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, "> ");
        assert_eq!(HISTORY_FILE, ".pseudo_history");
    }
}

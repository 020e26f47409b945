use crate::builtin::{Cd, Exit, Pwd};
use crate::command::{CommandFactory, ExitCode};
use crate::env::Environment;
use crate::external;
use crate::lexer;
use crate::parser;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::process::Child;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-in commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive command interpreter.
///
/// Owns the [`Environment`], the factories for built-in commands, and the set
/// of unreaped background jobs. One line of input at a time goes through
/// [`Interpreter::execute_line`]: tokenize, dispatch built-ins, classify into
/// a directive, and hand the directive to one of the process executors.
///
/// Example
/// ```no_run
/// use minish::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.execute_line("echo hello world").unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
    jobs: Vec<Child>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of built-in factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            builtins,
            jobs: Vec::new(),
        }
    }

    /// The interpreter's view of the environment.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Whether the `exit` built-in has asked the loop to terminate.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Execute one raw input line.
    ///
    /// A blank line is a no-op. Built-ins are dispatched by the literal first
    /// token, before classification, so `&`, `>`, and `|` on a built-in line
    /// are not honored. Everything else is classified into a directive and
    /// routed to the single-process or pipeline executor; exit statuses of
    /// external commands are discarded and 0 is returned.
    ///
    /// All failures this returns are recoverable: the caller reports them and
    /// keeps the loop running.
    pub fn execute_line(&mut self, line: &str) -> Result<ExitCode> {
        let tokens = lexer::split_into_tokens(line);
        let Some(name) = tokens.first() else {
            return Ok(0);
        };

        let args: Vec<&str> = tokens[1..].iter().map(String::as_str).collect();
        for factory in &self.builtins {
            if let Some(cmd) = factory.try_create(&self.env, name, &args) {
                return cmd.execute(&mut std::io::stdout(), &mut self.env);
            }
        }

        let directive = parser::classify(tokens)?;
        if directive.argv.is_empty() {
            // A line like a lone `&` strips down to nothing.
            return Ok(0);
        }

        match &directive.pipe_to {
            Some(right) => external::run_pipeline(
                &directive.argv,
                right,
                directive.background,
                directive.redirect.as_ref(),
                &self.env,
                &mut self.jobs,
            )?,
            None => external::run_single(
                &directive.argv,
                directive.background,
                directive.redirect.as_ref(),
                &self.env,
                &mut self.jobs,
            )?,
        }
        Ok(0)
    }

    /// Poll background jobs without blocking and reap any that finished,
    /// printing a short notice for each.
    pub fn reap_finished_jobs(&mut self) {
        self.jobs.retain_mut(|job| match job.try_wait() {
            Ok(Some(_)) => {
                println!("[{}] done", job.id());
                false
            }
            Ok(None) => true,
            Err(_) => false,
        });
    }

    /// The interactive read loop.
    ///
    /// Reads with a [`rustyline`] editor: entered lines go into the history,
    /// Ctrl-C abandons the current line, Ctrl-D ends the loop. Finished
    /// background jobs are reaped before each prompt. Per-line failures are
    /// reported and the loop continues; it ends on `exit` or end of input.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            self.reap_finished_jobs();
            match rl.readline("$ ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Err(err) = self.execute_line(&line) {
                        eprintln!("minish: {err:#}");
                    }
                    if self.env.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("minish: {err}");
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default built-ins: `cd`, `exit`, `pwd`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Pwd>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn blank_lines_are_noops_and_do_not_terminate() {
        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("").unwrap(), 0);
        assert_eq!(sh.execute_line("   \t ").unwrap(), 0);
        assert!(!sh.should_exit());
    }

    #[test]
    fn lone_ampersand_is_a_noop() {
        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("&").unwrap(), 0);
        assert!(sh.jobs.is_empty());
    }

    #[test]
    fn exit_signals_loop_termination() {
        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("exit").unwrap(), 0);
        assert!(sh.should_exit());
    }

    #[test]
    fn malformed_directive_is_recoverable() {
        let mut sh = Interpreter::default();
        assert!(sh.execute_line("echo hi >").is_err());
        // The interpreter keeps working after the report.
        assert_eq!(sh.execute_line("exit").unwrap(), 0);
    }

    #[test]
    fn builtin_lines_bypass_classification() {
        // `>` on a built-in line is just an argument, so `cd` receives a
        // target named `>` and fails locally instead of redirecting.
        let mut sh = Interpreter::default();
        let before = sh.env().current_dir.clone();
        assert_eq!(sh.execute_line("cd >").unwrap(), 1);
        assert_eq!(sh.env().current_dir, before);
    }

    #[test]
    fn unknown_commands_are_reported_not_fatal() {
        let mut sh = Interpreter::default();
        let err = sh.execute_line("no-such-program-zzz").unwrap_err();
        assert!(err.to_string().contains("command not found"));
        assert!(!sh.should_exit());
    }

    #[test]
    fn redirected_echo_ends_up_in_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("t.txt");
        let mut sh = Interpreter::default();

        sh.execute_line(&format!("echo hello > {}", out.display()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");
    }

    #[test]
    fn append_redirection_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("log.txt");
        let mut sh = Interpreter::default();

        sh.execute_line(&format!("echo one >> {}", out.display()))
            .unwrap();
        sh.execute_line(&format!("echo two >> {}", out.display()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn pipeline_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("t.txt");
        let mut sh = Interpreter::default();

        sh.execute_line(&format!("printf a | cat > {}", out.display()))
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "a");
        assert!(sh.jobs.is_empty());
    }

    #[test]
    fn background_jobs_are_reaped_by_the_poll_sweep() {
        let mut sh = Interpreter::default();
        sh.execute_line("sleep 0 &").unwrap();
        assert_eq!(sh.jobs.len(), 1);

        for _ in 0..500 {
            sh.reap_finished_jobs();
            if sh.jobs.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(sh.jobs.is_empty());
    }
}

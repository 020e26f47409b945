use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the interpreter at compile time.
///
/// Built-ins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process. They are recognized
/// by literal comparison of the first token of a line, before any directive
/// classification, so `&`, redirection, and pipe markers on a built-in line
/// are not honored.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match BuiltinCommand::execute(*self, stdout, env) {
            Ok(code) => Ok(code),
            Err(e) => {
                eprintln!("{e}");
                Ok(1)
            }
        }
    }
}

/// Produced when argh rejects the arguments of a recognized built-in; prints
/// the generated usage/error text instead of running the command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// With no target, or with the target `~`, changes to the invoking user's
/// home directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let dest = match self.target.as_deref() {
            None | Some("~") | Some("") => env
                .home_dir()
                .ok_or_else(|| anyhow!("cd: HOME not set"))?,
            Some(t) => {
                let path = PathBuf::from(t);
                if path.is_absolute() {
                    path
                } else {
                    env.current_dir.join(path)
                }
            }
        };

        let canonical = match fs::canonicalize(&dest) {
            Ok(p) => p,
            Err(_) => {
                return Err(anyhow!(
                    "cd: {}: No such file or directory",
                    self.target.as_deref().unwrap_or("~")
                ));
            }
        };

        // The working directory is process-wide state; keep the interpreter's
        // own view in sync with it.
        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: cannot enter {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// End the interactive loop. Any arguments are accepted and ignored.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; POSIX would read an exit status here.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

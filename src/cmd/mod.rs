//! The `osy-tool` subcommands.  Each one is a clap `Args` struct plus a
//! command struct wrapping it that implements `ToolCommand`.

use crate::config::OsyConfig;
use crate::errors::Result;

pub mod parser;

pub mod cmd_compile;
pub mod cmd_dump;
pub mod cmd_merge;
pub mod cmd_to_sqlite;
pub mod cmd_validate;

pub use self::cmd_compile::CompileCommand;
pub use self::cmd_dump::DumpCommand;
pub use self::cmd_merge::MergeCommand;
pub use self::cmd_to_sqlite::ToSqliteCommand;
pub use self::cmd_validate::ValidateCommand;

use self::parser::{Command, ToolOpts};

pub trait ToolCommand {
    fn execute(&self, config: &OsyConfig) -> Result<()>;
}

pub fn fab_command_from_opts(opts: ToolOpts) -> Box<dyn ToolCommand> {
    match opts.cmd {
        Command::Compile(c) => Box::new(CompileCommand { args: c }),

        Command::Dump(d) => Box::new(DumpCommand { args: d }),

        Command::Validate(v) => Box::new(ValidateCommand { args: v }),

        Command::Merge(m) => Box::new(MergeCommand { args: m }),

        Command::ToSqlite(ts) => Box::new(ToSqliteCommand { args: ts }),
    }
}

/// Parse the command line, load the configuration and run the subcommand.
pub fn run_from_opts(opts: ToolOpts) -> Result<()> {
    let config = OsyConfig::load_or_default(opts.config.as_deref())?;
    let command = fab_command_from_opts(opts);
    command.execute(&config)
}

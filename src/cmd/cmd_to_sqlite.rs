use std::path::PathBuf;

use clap::Args;

use super::ToolCommand;
use crate::config::OsyConfig;
use crate::errors::Result;
use crate::file_format::osy::load_file;
use crate::file_format::sqlite::export_to_sqlite;

/// Export an `.osy` file as a SQLite database.  An existing output is replaced.
#[derive(Debug, Args)]
pub struct ToSqlite {
    #[clap(value_parser)]
    pub input: PathBuf,

    #[clap(value_parser)]
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct ToSqliteCommand {
    pub args: ToSqlite,
}

impl ToolCommand for ToSqliteCommand {
    fn execute(&self, _config: &OsyConfig) -> Result<()> {
        let db = load_file(&self.args.input)?;
        export_to_sqlite(&db, &self.args.output)?;
        println!("Exported {} to {}", db.counts(), self.args.output.display());
        Ok(())
    }
}

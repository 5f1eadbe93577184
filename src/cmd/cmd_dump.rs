use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;

use super::ToolCommand;
use crate::config::OsyConfig;
use crate::describe::{describe_db, dump_json};
use crate::errors::Result;
use crate::file_format::osy::load_file;

/// Print the contents of `.osy` files.
#[derive(Debug, Args)]
pub struct Dump {
    #[clap(required = true, value_parser)]
    pub inputs: Vec<PathBuf>,

    /// Emit one JSON record per line instead of the indented listing.
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug)]
pub struct DumpCommand {
    pub args: Dump,
}

impl ToolCommand for DumpCommand {
    fn execute(&self, _config: &OsyConfig) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        for input in &self.args.inputs {
            let db = load_file(input)?;
            if self.args.json {
                dump_json(&db, &mut out)?;
            } else {
                if self.args.inputs.len() > 1 {
                    writeln!(out, "== {} ==", input.display())?;
                }
                describe_db(&db, &mut out)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

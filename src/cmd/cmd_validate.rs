use std::path::PathBuf;

use clap::Args;

use super::ToolCommand;
use crate::config::OsyConfig;
use crate::db::validate::check_consistency;
use crate::errors::{OsyError, Result};
use crate::file_format::osy::load_file;

/// Load `.osy` files and check their cross-table invariants.
#[derive(Debug, Args)]
pub struct Validate {
    #[clap(required = true, value_parser)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct ValidateCommand {
    pub args: Validate,
}

impl ToolCommand for ValidateCommand {
    fn execute(&self, _config: &OsyConfig) -> Result<()> {
        let mut bad_files = 0;
        for input in &self.args.inputs {
            let db = match load_file(input) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("{}", e);
                    bad_files += 1;
                    continue;
                }
            };
            let violations = check_consistency(&db);
            if violations.is_empty() {
                println!("{}: ok ({})", input.display(), db.counts());
                continue;
            }
            bad_files += 1;
            for violation in &violations {
                eprintln!("{}: {}", input.display(), violation);
            }
        }
        if bad_files > 0 {
            return Err(OsyError::Failed(format!(
                "{} of {} files are invalid",
                bad_files,
                self.args.inputs.len()
            )));
        }
        Ok(())
    }
}

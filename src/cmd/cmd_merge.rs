use std::path::PathBuf;

use clap::Args;

use super::ToolCommand;
use crate::config::OsyConfig;
use crate::errors::Result;
use crate::file_format::merger::merge_files;

/// Merge several `.osy` files into one, unifying shared declarations.
#[derive(Debug, Args)]
pub struct Merge {
    /// Files to merge; the first one is the base.
    #[clap(required = true, value_parser)]
    pub inputs: Vec<PathBuf>,

    #[clap(long, short, value_parser)]
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct MergeCommand {
    pub args: Merge,
}

impl ToolCommand for MergeCommand {
    fn execute(&self, config: &OsyConfig) -> Result<()> {
        let merged = merge_files(&self.args.inputs, &self.args.output, config.compression_level)?;
        println!("Wrote {}: {}", self.args.output.display(), merged.counts());
        Ok(())
    }
}

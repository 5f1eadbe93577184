use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::cmd_compile::Compile;
use super::cmd_dump::Dump;
use super::cmd_merge::Merge;
use super::cmd_to_sqlite::ToSqlite;
use super::cmd_validate::Validate;

/// Build, inspect, merge and export OSY symbol databases.
#[derive(Debug, Parser)]
#[clap(name = "osy-tool", version)]
pub struct ToolOpts {
    /// JSON configuration file; see `OsyConfig` for the recognized fields.
    #[clap(long, env = "OSY_CONFIG", value_parser)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Compile(Compile),
    Dump(Dump),
    Validate(Validate),
    Merge(Merge),
    ToSqlite(ToSqlite),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_many_inputs_and_one_output() {
        let opts =
            ToolOpts::try_parse_from(["osy-tool", "merge", "a.osy", "b.osy", "c.osy", "-o", "out.osy"])
                .unwrap();
        match opts.cmd {
            Command::Merge(merge) => {
                assert_eq!(merge.inputs.len(), 3);
                assert_eq!(merge.output, PathBuf::from("out.osy"));
            }
            other => panic!("parsed as {:?}", other),
        }
    }

    #[test]
    fn subcommands_are_kebab_case() {
        let opts = ToolOpts::try_parse_from(["osy-tool", "to-sqlite", "in.osy", "out.sqlite"]).unwrap();
        assert!(matches!(opts.cmd, Command::ToSqlite(_)));
    }

    #[test]
    fn merge_without_output_is_rejected() {
        assert!(ToolOpts::try_parse_from(["osy-tool", "merge", "a.osy"]).is_err());
    }
}

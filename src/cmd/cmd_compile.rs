use std::path::{Path, PathBuf};

use clap::Args;

use super::ToolCommand;
use crate::build::BuildOptions;
use crate::config::OsyConfig;
use crate::errors::{OsyError, Result};
use crate::file_format::osy::save_file;
use crate::file_format::producer::read_producer_file;
use crate::file_utils::is_up_to_date;
use crate::pool::run_jobs;

/// Turn producer ND-JSON dumps into `.osy` files, one per input.
#[derive(Debug, Args)]
pub struct Compile {
    /// Producer dumps, one translation unit each.
    #[clap(required = true, value_parser)]
    pub inputs: Vec<PathBuf>,

    /// Where to put the outputs.  Defaults to next to each input.
    #[clap(long, short, value_parser)]
    pub out_dir: Option<PathBuf>,

    /// Rebuild even if the output is newer than the input.
    #[clap(long)]
    pub force: bool,

    /// Worker threads; overrides the configuration.
    #[clap(long, short, value_parser)]
    pub jobs: Option<usize>,
}

#[derive(Debug)]
pub struct CompileCommand {
    pub args: Compile,
}

enum Outcome {
    Written(String),
    Skipped,
    Failed(String),
}

pub fn output_path_for(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".osy");
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn compile_one(input: &Path, output: &Path, options: BuildOptions, level: u32) -> Result<String> {
    let _span = info_span!("compile", input = %input.display()).entered();
    let (ctx, read_stats) = read_producer_file(input, options)?;
    let (db, stats) = ctx.finish();
    save_file(&db, output, level)?;
    info!(
        input = %input.display(),
        records = read_stats.records,
        skipped_lines = read_stats.skipped_lines,
        pruned = stats.pruned,
        collapsed = stats.collapse.collapsed,
        withheld = stats.withheld,
        "compiled"
    );
    Ok(format!("{}: {}", output.display(), db.counts()))
}

impl ToolCommand for CompileCommand {
    fn execute(&self, config: &OsyConfig) -> Result<()> {
        if self.args.jobs == Some(0) {
            return Err(OsyError::Usage("--jobs must be at least 1".to_string()));
        }
        let workers = self.args.jobs.unwrap_or_else(|| config.worker_count());
        let options = BuildOptions::from(config);
        let skip_fresh = config.skip_up_to_date && !self.args.force;
        let out_dir = self.args.out_dir.as_deref();

        let jobs: Vec<(PathBuf, PathBuf)> = self
            .args
            .inputs
            .iter()
            .map(|input| (input.clone(), output_path_for(input, out_dir)))
            .collect();

        let outcomes = run_jobs(jobs, workers, |(input, output)| {
            if skip_fresh && is_up_to_date(&input, &output) {
                debug!(input = %input.display(), "up to date");
                return Outcome::Skipped;
            }
            match compile_one(&input, &output, options, config.compression_level) {
                Ok(summary) => Outcome::Written(summary),
                Err(e) => Outcome::Failed(format!("{}: {}", input.display(), e)),
            }
        });

        let mut failures = 0;
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                Outcome::Written(summary) => println!("{}", summary),
                Outcome::Skipped => skipped += 1,
                Outcome::Failed(message) => {
                    eprintln!("{}", message);
                    failures += 1;
                }
            }
        }
        if skipped > 0 {
            println!("{} up-to-date inputs skipped", skipped);
        }
        if failures > 0 {
            return Err(OsyError::Failed(format!(
                "{} of {} inputs failed to compile",
                failures,
                self.args.inputs.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_go_next_to_inputs_or_into_out_dir() {
        assert_eq!(
            output_path_for(Path::new("dumps/a.cpp.json"), None),
            PathBuf::from("dumps/a.cpp.osy")
        );
        assert_eq!(
            output_path_for(Path::new("dumps/b.json"), Some(Path::new("out"))),
            PathBuf::from("out/b.osy")
        );
    }

    #[test]
    fn bad_inputs_are_reported_without_stopping_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, "{\"unit\":{\"file\":\"good.cpp\"}}\n").unwrap();
        let missing = dir.path().join("missing.json");

        let cmd = CompileCommand {
            args: Compile {
                inputs: vec![good, missing],
                out_dir: None,
                force: true,
                jobs: Some(2),
            },
        };
        let err = cmd.execute(&OsyConfig::default()).unwrap_err();
        assert!(matches!(err, OsyError::Failed(_)));
        assert!(dir.path().join("good.osy").exists());
        assert!(!dir.path().join("missing.osy").exists());
    }
}

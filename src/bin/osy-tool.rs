use clap::Parser;

extern crate osytools;
use osytools::cmd::parser::ToolOpts;
use osytools::cmd::run_from_opts;
use osytools::logging::init_logging;

fn main() {
    init_logging();

    let opts = ToolOpts::parse();
    if let Err(e) = run_from_opts(opts) {
        eprintln!("osy-tool: {}", e);
        std::process::exit(1);
    }
}

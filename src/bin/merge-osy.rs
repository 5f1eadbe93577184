//! Merge the `.osy` files given as arguments into a single output file.  Nodes
//! that several inputs share, such as declarations from a common header, are
//! stored once in the result.

use std::env;
use std::path::PathBuf;

extern crate osytools;
use osytools::file_format::merger::merge_files;
use osytools::logging::init_logging;

fn main() {
    init_logging();

    let args: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();

    if args.len() < 2 {
        eprintln!("Usage: merge-osy <output> <input> [<input> [...]]");
        eprintln!("  This tool merges the given symbol databases into <output>,");
        eprintln!("  using the zlib level from $OSY_COMPRESSION_LEVEL if set.");
        std::process::exit(1);
    }

    let level = match env::var("OSY_COMPRESSION_LEVEL") {
        Ok(v) => match v.parse::<u32>() {
            Ok(level) if level <= 9 => level,
            _ => {
                eprintln!("OSY_COMPRESSION_LEVEL must be 0-9, got {:?}", v);
                std::process::exit(1);
            }
        },
        Err(_) => 6,
    };

    if let Err(e) = merge_files(&args[1..], &args[0], level) {
        eprintln!("merge-osy: {}", e);
        std::process::exit(1);
    }
}

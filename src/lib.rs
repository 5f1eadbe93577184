extern crate serde;
extern crate serde_json;

extern crate clap;
extern crate flate2;
extern crate itertools;
#[macro_use]
extern crate lazy_static;
extern crate rusqlite;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

pub mod build;
pub mod cmd;
pub mod config;
pub mod db;
pub mod describe;
pub mod errors;
pub mod file_format;
pub mod file_utils;
pub mod hashing;
pub mod kinds;
pub mod logging;
pub mod pool;

pub use db::SymbolDb;
pub use errors::{OsyError, Result};

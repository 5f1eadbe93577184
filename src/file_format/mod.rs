pub mod io_helpers;
pub mod merger;
pub mod osy;
pub mod producer;
pub mod sqlite;

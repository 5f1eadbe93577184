use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::errors::{OsyError, Result};

/// A temporary file in the directory that will hold `file_path`, creating
/// that directory if needed.  Persisting it over `file_path` is a rename, so
/// readers never see a partial file.
pub fn staging_file_for(file_path: &Path) -> Result<NamedTempFile> {
    let parent_path = match file_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => {
            return Err(OsyError::Usage(format!(
                "Problem getting parent of '{}'",
                file_path.display()
            )));
        }
    };
    std::fs::create_dir_all(&parent_path)?;
    Ok(NamedTempFile::new_in(&parent_path)?)
}

/// Write `contents` to `file_path` through a staging file, creating the
/// parent directory if needed.
pub fn write_file_atomically(file_path: &Path, contents: &[u8]) -> Result<()> {
    let mut staged = staging_file_for(file_path)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(file_path).map_err(|e| e.error)?;
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True if `output` exists and is at least as new as `input`.  When either
/// time cannot be read the answer is "no", so the caller rebuilds.
pub fn is_up_to_date(input: &Path, output: &Path) -> bool {
    match (modified(input), modified(output)) {
        (Some(input_time), Some(output_time)) => output_time >= input_time,
        (input_time, _) => {
            if input_time.is_none() {
                debug!(path = %input.display(), "could not read modification time");
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.osy");
        write_file_atomically(&path, b"first").unwrap();
        write_file_atomically(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn missing_output_is_never_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.ndjson");
        std::fs::write(&input, b"").unwrap();
        assert!(!is_up_to_date(&input, &dir.path().join("missing.osy")));
        let output = dir.path().join("out.osy");
        std::fs::write(&output, b"").unwrap();
        assert!(is_up_to_date(&input, &output));
    }
}

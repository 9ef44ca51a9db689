//! On-disk artifact layout and the atomic replace protocol (C9).
//!
//! Every final artifact (postings, norms, IDF) is written under a scratch
//! name in its target directory, fsynced, then renamed over the live name.
//! A crash between those two steps leaves the previous artifact intact —
//! the rename is the only step that can be observed as "the new version
//! exists".

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{IndexError, Result};

/// Serialize `value` to JSON, write it under a scratch name in `dir`, fsync,
/// then rename over `final_name`. Returns the final path.
pub fn write_atomic<T: Serialize>(dir: &Path, final_name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;

    let final_path = dir.join(final_name);
    let scratch_path = dir.join(format!("{final_name}.scratch"));

    let mut file = File::create(&scratch_path).map_err(|e| IndexError::io(&scratch_path, e))?;
    let bytes = serde_json::to_vec(value)?;
    file.write_all(&bytes).map_err(|e| IndexError::io(&scratch_path, e))?;
    file.sync_all().map_err(|e| IndexError::io(&scratch_path, e))?;
    drop(file);

    std::fs::rename(&scratch_path, &final_path).map_err(|e| IndexError::io(&final_path, e))?;
    Ok(final_path)
}

/// Load a JSON artifact written by [`write_atomic`].
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Name of the `i`-th SPIMI temporary block file.
pub fn temp_block_name(i: usize) -> String {
    format!("temp_block_{i}.bin")
}

/// Remove every `temp_block_*.bin` file in `dir`. Missing `dir` is not an
/// error (nothing to clean up).
pub fn clear_temp_blocks(dir: &Path) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(IndexError::io(dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| IndexError::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("temp_block_") && name.ends_with(".bin") {
            std::fs::remove_file(entry.path()).map_err(|e| IndexError::io(entry.path(), e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn atomic_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = HashMap::new();
        map.insert("a".to_string(), 1u32);

        let path = write_atomic(dir.path(), "final.json", &map).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("final.json.scratch").exists());

        let loaded: HashMap<String, u32> = read_artifact(&path).unwrap();
        assert_eq!(loaded.get("a"), Some(&1));
    }

    #[test]
    fn second_write_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "final.json", &vec![1, 2, 3]).unwrap();
        write_atomic(dir.path(), "final.json", &vec![4, 5]).unwrap();

        let loaded: Vec<i32> = read_artifact(&dir.path().join("final.json")).unwrap();
        assert_eq!(loaded, vec![4, 5]);
    }

    #[test]
    fn clear_temp_blocks_only_removes_matching_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("temp_block_0.bin"), b"x").unwrap();
        std::fs::write(dir.path().join("temp_block_1.bin"), b"x").unwrap();
        std::fs::write(dir.path().join("final_index.bin"), b"x").unwrap();

        clear_temp_blocks(dir.path()).unwrap();

        assert!(!dir.path().join("temp_block_0.bin").exists());
        assert!(!dir.path().join("temp_block_1.bin").exists());
        assert!(dir.path().join("final_index.bin").exists());
    }

    #[test]
    fn clear_temp_blocks_missing_dir_is_ok() {
        clear_temp_blocks(Path::new("/nonexistent/dir/for/tonal/tests")).unwrap();
    }
}

//! JSON documents on disk
//!
//! Saves go through a temp file in the target directory followed by a rename,
//! so a crash mid-save leaves the previous document intact.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::interface::{SimpleCpError, SimpleCpResult};

fn persistence_error(operation: &'static str, path: &Path, source: io::Error) -> SimpleCpError {
    SimpleCpError::Persistence {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

/// Write `value` as pretty JSON, atomically replacing any existing file.
/// Missing parent directories are created.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> SimpleCpResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| persistence_error("create directory for", path, e))?;

    let json = serde_json::to_vec_pretty(value).map_err(|e| SimpleCpError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| persistence_error("create temp file for", path, e))?;
    tmp.write_all(&json)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| persistence_error("write", path, e))?;
    tmp.persist(path)
        .map_err(|e| persistence_error("replace", path, e.error))?;

    log::debug!("Saved {} ({} bytes)", path.display(), json.len());
    Ok(())
}

/// Read a JSON document. A missing file is `Ok(None)`; an unreadable or
/// malformed one is an error so the caller can decide to keep its state.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> SimpleCpResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} does not exist yet", path.display());
            return Ok(None);
        }
        Err(e) => return Err(persistence_error("read", path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SimpleCpError::Malformed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        values: Vec<u32>,
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let doc = Doc {
            name: "a".to_string(),
            values: vec![1, 2, 3],
        };

        write_json_atomic(&path, &doc).unwrap();
        let loaded: Option<Doc> = read_json(&path).unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        for i in 0..3 {
            let doc = Doc {
                name: format!("v{}", i),
                values: vec![i],
            };
            write_json_atomic(&path, &doc).unwrap();
        }

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let loaded: Doc = read_json(&path).unwrap().unwrap();
        assert_eq!(loaded.name, "v2");
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Doc> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let result: SimpleCpResult<Option<Doc>> = read_json(&path);
        assert!(matches!(result, Err(SimpleCpError::Malformed { .. })));
    }
}

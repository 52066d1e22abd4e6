// File: src/persistence.rs
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Error, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `path` through a temp file in the same directory, then renames it
/// into place. Readers see either the old file or the complete new one.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<(), Error>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Error>,
{
    let parent_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        fill(&mut writer)?;
        writer.flush()?;
    }

    temp_file.persist(path)?;
    Ok(())
}

pub fn save_bincode<T: Serialize>(value: &T, path: &Path) -> Result<(), Error> {
    write_atomic(path, |writer| {
        bincode::serialize_into(writer, value).map_err(|e| Error::new(ErrorKind::Other, e))
    })
}

/// Reads the whole file before decoding so a truncated or garbage file can
/// only fail, never over-allocate.
pub fn load_bincode<T: DeserializeOwned>(path: &Path) -> Result<T, bincode::Error> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes)
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), Error> {
    write_atomic(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)
    })
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<u32>,
    }

    #[test]
    fn test_write_atomic_creates_missing_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("file.txt");

        write_atomic(&path, |w| w.write_all(b"hello")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_write_atomic_failure_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "old").unwrap();

        let result = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(Error::new(ErrorKind::Other, "boom"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_json_preserves_non_ascii_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");
        let value = vec!["第一".to_string(), "測試".to_string()];

        save_json(&value, &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("第一"));
        let loaded: Vec<String> = load_json(&path).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_load_bincode_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.bin");
        fs::write(&path, [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f, 1]).unwrap();

        let result: Result<Sample, _> = load_bincode(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_bincode_file_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.bin");
        let value = Sample {
            name: "abc".into(),
            values: vec![3, 1, 2],
        };

        save_bincode(&value, &path).unwrap();
        let loaded: Sample = load_bincode(&path).unwrap();

        assert_eq!(loaded, value);
    }
}

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::store::{KeyValueStore, StoreError};

/// One `<key>.json` file per key under a data directory.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    /// Default data directory, `<data_dir>/snipdrill`.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snipdrill")
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir).map_err(|source| StoreError::Io {
            key: base_dir.display().to_string(),
            source,
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{key}.json")))
    }
}

fn io_err(key: &str) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.file_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.file_path(key)?;
        let tmp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&tmp_path).map_err(io_err(key))?;
        file.write_all(value.as_bytes()).map_err(io_err(key))?;
        file.sync_all().map_err(io_err(key))?;

        fs::rename(&tmp_path, &path).map_err(io_err(key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.file_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn make_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, mut store) = make_store();
        assert_eq!(store.get("prefs").unwrap(), None);

        store.set("prefs", "{\"a\":1}").unwrap();
        assert_eq!(store.get("prefs").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.base_dir().join("prefs.json").exists());

        store.set("prefs", "{}").unwrap();
        assert_eq!(store.get("prefs").unwrap().as_deref(), Some("{}"));

        store.remove("prefs").unwrap();
        assert_eq!(store.get("prefs").unwrap(), None);
        // Removing a missing key is fine
        store.remove("prefs").unwrap();
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let (_dir, mut store) = make_store();
        store.set("history", "[]").unwrap();
        assert!(!store.base_dir().join("history.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_dir, mut store) = make_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }
}

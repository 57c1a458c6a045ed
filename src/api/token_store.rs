use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the bearer token survives between runs.
pub trait TokenStore: Send {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    fn clear(&mut self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_string())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        *self.token.get_mut().map_err(|_| io::Error::other("token store poisoned"))? = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        *self.token.get_mut().map_err(|_| io::Error::other("token store poisoned"))? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileTokenStore::new(dir.path().join("nested").join("token"));
        assert_eq!(store.load(), None);
        store.save("abc.def").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc.def"));
        store.clear().unwrap();
        assert_eq!(store.load(), None);
        store.clear().unwrap();
    }

    #[test]
    fn memory_store() {
        let mut store = MemoryTokenStore::with_token("t1");
        assert_eq!(store.load().as_deref(), Some("t1"));
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }
}

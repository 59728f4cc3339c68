//! Cookie storage backends for the session store.
//!
//! A jar is a flat name → value map. Every change goes through `update`, which
//! applies all sets and removals in a single write so related cookies can
//! never be observed half-written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

/// Cookie jar file name in the cache directory
const COOKIE_FILE: &str = "cookies.json";

pub type Cookies = BTreeMap<String, String>;

pub trait CookieJar: Send + Sync {
    /// Snapshot of every cookie currently stored
    fn read(&self) -> Cookies;

    /// Set and remove cookies as one write
    fn update(&self, set: &[(&str, String)], remove: &[&str]) -> Result<()>;
}

fn apply(cookies: &mut Cookies, set: &[(&str, String)], remove: &[&str]) {
    for name in remove {
        cookies.remove(*name);
    }
    for (name, value) in set {
        cookies.insert((*name).to_string(), value.clone());
    }
}

/// Jar persisted as JSON in the cache directory so sessions survive restarts.
pub struct FileCookieJar {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCookieJar {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(COOKIE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Cookies> {
        if !self.path.exists() {
            return Ok(Cookies::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read cookie jar")?;
        serde_json::from_str(&contents).context("Failed to parse cookie jar")
    }
}

impl CookieJar for FileCookieJar {
    fn read(&self) -> Cookies {
        match self.load() {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Unreadable cookie jar, treating as empty");
                Cookies::new()
            }
        }
    }

    fn update(&self, set: &[(&str, String)], remove: &[&str]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Cookie jar lock poisoned"))?;

        let mut cookies = self.read();
        apply(&mut cookies, set, remove);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Replace the file in one rename so readers never see a partial jar
        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&cookies)?;
        std::fs::write(&tmp, contents).context("Failed to write cookie jar")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace cookie jar")?;
        Ok(())
    }
}

/// In-process jar for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<Cookies>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies(cookies: &[(&str, &str)]) -> Self {
        let map = cookies
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            cookies: Mutex::new(map),
        }
    }
}

impl CookieJar for MemoryCookieJar {
    fn read(&self) -> Cookies {
        self.cookies
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn update(&self, set: &[(&str, String)], remove: &[&str]) -> Result<()> {
        let mut cookies = self
            .cookies
            .lock()
            .map_err(|_| anyhow::anyhow!("Cookie jar lock poisoned"))?;
        apply(&mut cookies, set, remove);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "catchook-cookies-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_jar_update() {
        let jar = MemoryCookieJar::with_cookies(&[("theme", "dark")]);
        jar.update(&[("a", "1".to_string()), ("b", "2".to_string())], &[])
            .unwrap();
        assert_eq!(jar.read().len(), 3);

        jar.update(&[], &["a", "b", "missing"]).unwrap();
        let cookies = jar.read();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_file_jar_persists_across_instances() {
        let dir = scratch_dir("persist");
        let jar = FileCookieJar::new(&dir);
        assert!(jar.read().is_empty());

        jar.update(&[("session_id", "abc".to_string())], &[]).unwrap();

        let reopened = FileCookieJar::new(&dir);
        assert_eq!(
            reopened.read().get("session_id").map(String::as_str),
            Some("abc")
        );
        assert!(!dir.join("cookies.json.tmp").exists());

        reopened.update(&[], &["session_id"]).unwrap();
        assert!(jar.read().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_jar_corrupt_file_reads_empty() {
        let dir = scratch_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(COOKIE_FILE), "not json").unwrap();

        let jar = FileCookieJar::new(&dir);
        assert!(jar.read().is_empty());

        // A write recovers the file
        jar.update(&[("k", "v".to_string())], &[]).unwrap();
        assert_eq!(jar.read().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

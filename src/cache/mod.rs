// src/cache/mod.rs

use anyhow::{Context, Result};
use chrono::Utc;
use glob::glob;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Read-through disk cache of immutable source bytes, owned by the retrieval
/// side. The transform core never sees it.
///
/// The key is the sanitized source URL plus a TTL bucket
/// (`unix_seconds / ttl_seconds`): an entry is fresh exactly while the wall
/// clock stays in the bucket it was written under, so every consumer of the
/// same URL within a bucket reads identical bytes.
///
/// `new(...)` scans the directory and indexes the entries already on disk, so
/// a restarted process keeps its hits. Writes go through a `.tmp` file and an
/// atomic rename.
pub struct ByteCache {
    cache_dir: PathBuf,
    ttl_secs: u64,
    /// `(key, bucket)` pairs present on disk.
    seen: Mutex<HashSet<(String, u64)>>,
}

impl ByteCache {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let cache_dir: PathBuf = cache_dir.into();
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("creating cache directory {}", cache_dir.display()))?;

        let mut initial_set = HashSet::new();
        let pattern = format!("{}/{}", cache_dir.display(), "*.bin");
        for entry in glob(&pattern).context("invalid glob pattern for ByteCache::new")? {
            let path = match entry {
                Ok(p) => p,
                Err(_) => continue,
            };
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };

            // Expect "<key>---<bucket>.bin"
            let Some(stem) = file_name.strip_suffix(".bin") else {
                continue;
            };
            let parts: Vec<&str> = stem.split("---").collect();
            if parts.len() != 2 {
                continue;
            }
            let Ok(bucket) = parts[1].parse::<u64>() else {
                continue;
            };
            initial_set.insert((parts[0].to_string(), bucket));
        }

        Ok(ByteCache {
            cache_dir,
            ttl_secs: ttl.as_secs().max(1),
            seen: Mutex::new(initial_set),
        })
    }

    fn current_bucket(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64 / self.ttl_secs
    }

    fn entry_path(&self, key: &str, bucket: u64) -> PathBuf {
        self.cache_dir.join(format!("{}---{}.bin", key, bucket))
    }

    /// Fresh bytes for `url`, or `None` when the current bucket has no entry.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        let key = safe_key(url);
        let bucket = self.current_bucket();
        {
            let seen = self.seen.lock().unwrap();
            if !seen.contains(&(key.clone(), bucket)) {
                return None;
            }
        }
        match fs::read(self.entry_path(&key, bucket)) {
            Ok(bytes) => {
                debug!(url, bucket, "cache hit");
                Some(bytes)
            }
            Err(_) => None,
        }
    }

    /// Store the bytes for `url` under the current bucket.
    pub fn put(&self, url: &str, bytes: &[u8]) -> Result<()> {
        let key = safe_key(url);
        let bucket = self.current_bucket();

        let final_path = self.entry_path(&key, bucket);
        let tmp_path = final_path.with_extension("bin.tmp");

        fs::write(&tmp_path, bytes)
            .with_context(|| format!("writing cache entry {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &final_path).with_context(|| {
            format!("renaming {} to {}", tmp_path.display(), final_path.display())
        })?;

        self.seen.lock().unwrap().insert((key, bucket));
        Ok(())
    }

    /// Delete every entry outside the current bucket. Returns how many files
    /// were removed.
    pub fn purge(&self) -> Result<usize> {
        let bucket = self.current_bucket();
        let mut seen = self.seen.lock().unwrap();

        let stale: Vec<(String, u64)> = seen
            .iter()
            .filter(|(_, b)| *b != bucket)
            .cloned()
            .collect();

        let mut removed = 0usize;
        for (key, b) in stale {
            let path = self.entry_path(&key, b);
            fs::remove_file(&path)
                .with_context(|| format!("deleting stale cache entry {}", path.display()))?;
            seen.remove(&(key, b));
            removed += 1;
        }
        Ok(removed)
    }
}

/// URLs become filenames; anything outside ASCII alphanumerics maps to `_`,
/// which keeps the `---` bucket separator unambiguous.
fn safe_key(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const URL: &str = "https://www.indec.gob.ar/ftp/cuadros/economia/indice_ipim.csv";

    #[test]
    fn put_then_get_round_trips_within_a_bucket() -> Result<()> {
        let dir = tempdir()?;
        let cache = ByteCache::new(dir.path(), Duration::from_secs(3600))?;

        assert_eq!(cache.get(URL), None);
        cache.put(URL, b"periodo;apertura;indice")?;
        assert_eq!(cache.get(URL).as_deref(), Some(&b"periodo;apertura;indice"[..]));
        Ok(())
    }

    #[test]
    fn a_fresh_instance_rescans_the_directory() -> Result<()> {
        let dir = tempdir()?;
        {
            let cache = ByteCache::new(dir.path(), Duration::from_secs(3600))?;
            cache.put(URL, b"payload")?;
        }
        let cache = ByteCache::new(dir.path(), Duration::from_secs(3600))?;
        assert_eq!(cache.get(URL).as_deref(), Some(&b"payload"[..]));
        Ok(())
    }

    #[test]
    fn stale_buckets_miss_and_purge_removes_them() -> Result<()> {
        let dir = tempdir()?;
        // bucket 1 is decades in the past for an hourly TTL
        fs::write(dir.path().join("stalekey---1.bin"), b"old")?;

        let cache = ByteCache::new(dir.path(), Duration::from_secs(3600))?;
        assert_eq!(cache.get("stalekey"), None);

        cache.put(URL, b"fresh")?;
        let removed = cache.purge()?;
        assert_eq!(removed, 1);
        assert!(!dir.path().join("stalekey---1.bin").exists());
        // the fresh entry survives the purge
        assert_eq!(cache.get(URL).as_deref(), Some(&b"fresh"[..]));
        Ok(())
    }

    #[test]
    fn keys_are_filesystem_safe() {
        let key = safe_key("https://example.com/a b/c?x=1");
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert!(!key.contains("---"));
    }
}

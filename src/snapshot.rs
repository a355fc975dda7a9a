//! Snapshot Module
//!
//! Best-effort persistence of the store as a line-oriented text file, one
//! `key value expire_at` record per line.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cache::{now_unix, ByteView, CacheMemory, Entry, NO_EXPIRY};
use crate::error::{CacheError, Result};

/// Entries closer than this to expiry are not worth persisting.
pub const MIN_REMAINING_SECS: i64 = 30;

/// One persisted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
    pub expire_at: i64,
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

// == Save ==
/// Writes `entries` to `path`, returning the number of records written.
///
/// The file is replaced atomically through a sibling temp file.
pub fn save(path: &Path, entries: &[Entry<ByteView>]) -> Result<usize> {
    let now = now_unix();
    let mut body = String::new();
    let mut written = 0;

    for entry in entries {
        if entry.expire_at != NO_EXPIRY && entry.expire_at - now < MIN_REMAINING_SECS {
            continue;
        }
        let Some(value) = entry.value.as_str() else {
            warn!("Skipping key '{}' in snapshot: value is not UTF-8", entry.key);
            continue;
        };
        if !is_token(&entry.key) || !is_token(value) {
            warn!("Skipping key '{}' in snapshot: contains whitespace", entry.key);
            continue;
        }
        body.push_str(&format!("{} {} {}\n", entry.key, value, entry.expire_at));
        written += 1;
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    info!("Saved {} entries to snapshot {}", written, path.display());
    Ok(written)
}

// == Load ==
/// Reads records from `path`, skipping malformed and expired ones.
/// A missing file yields no records.
pub fn load(path: &Path) -> Result<Vec<Record>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No snapshot at {}", path.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(CacheError::Snapshot(err.to_string())),
    };

    let now = now_unix();
    let mut records = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(record) if record.expire_at == NO_EXPIRY || record.expire_at > now => {
                records.push(record)
            }
            Some(_) => {}
            None => warn!("Skipping malformed snapshot line {}: '{}'", lineno + 1, line),
        }
    }
    Ok(records)
}

fn parse_line(line: &str) -> Option<Record> {
    let mut fields = line.split_whitespace();
    let key = fields.next()?;
    let value = fields.next()?;
    let expire_at: i64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || (expire_at < 0 && expire_at != NO_EXPIRY) {
        return None;
    }
    Some(Record {
        key: key.to_string(),
        value: value.to_string(),
        expire_at,
    })
}

// == Restore ==
/// Writes `records` into `store`, converting absolute expiries back into
/// remaining TTLs. Returns the number of records applied.
pub fn restore<S>(store: &S, records: Vec<Record>) -> usize
where
    S: CacheMemory<ByteView> + ?Sized,
{
    let now = now_unix();
    let mut applied = 0;
    for record in records {
        let value = ByteView::from(record.value);
        if record.expire_at == NO_EXPIRY {
            store.set_without_ttl(&record.key, value);
        } else if record.expire_at > now {
            store.set_with_ttl(&record.key, value, record.expire_at - now);
        } else {
            continue;
        }
        applied += 1;
    }
    applied
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Store, Strategy};
    use tempfile::tempdir;

    fn entry(key: &str, value: &str, expire_at: i64) -> Entry<ByteView> {
        Entry::new(key, ByteView::from(value), expire_at)
    }

    #[test]
    fn test_save_filters_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup").join("backup.txt");
        let now = now_unix();

        let entries = vec![
            entry("Tom", "630", NO_EXPIRY),
            entry("Jack", "589", now + 120),
            entry("soon", "1", now + 5),
            entry("spaced", "a b", NO_EXPIRY),
            Entry::new("bin", ByteView::from(vec![0xff, 0xfe]), NO_EXPIRY),
        ];

        assert_eq!(save(&path, &entries).unwrap(), 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            format!("Tom 630 -1\nJack 589 {}\n", now + 120)
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_skips_expired_and_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        let now = now_unix();
        fs::write(
            &path,
            format!(
                "Tom 630 -1\nold 1 {}\nbroken line\nJack 589 {}\nx y notanumber\n\n",
                now - 10,
                now + 100
            ),
        )
        .unwrap();

        let records = load(&path).unwrap();
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Tom", "Jack"]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load(&dir.path().join("nope.txt")).unwrap().is_empty());
    }

    #[test]
    fn test_restore_uses_remaining_ttl() {
        let now = now_unix();
        let store: Store<ByteView> = Store::new(Strategy::Lru, 0, None);
        let records = vec![
            Record { key: "Tom".into(), value: "630".into(), expire_at: NO_EXPIRY },
            Record { key: "Jack".into(), value: "589".into(), expire_at: now + 100 },
            Record { key: "gone".into(), value: "1".into(), expire_at: now - 1 },
        ];

        assert_eq!(restore(&store, records), 2);
        assert_eq!(store.ttl("Tom"), NO_EXPIRY);
        let jack = store.ttl("Jack");
        assert!((99..=100).contains(&jack), "ttl {}", jack);
        assert_eq!(store.get("Jack").map(|v| v.to_string()), Some("589".to_string()));
        assert!(store.get("gone").is_none());
    }

    #[test]
    fn test_save_then_restore() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        let source: Store<ByteView> = Store::new(Strategy::Lfu, 0, None);
        source.set_without_ttl("Sam", ByteView::from("567"));
        source.set_with_ttl("Tom", ByteView::from("630"), 300);

        save(&path, &source.get_all()).unwrap();
        let target: Store<ByteView> = Store::new(Strategy::Fifo, 0, None);
        restore(&target, load(&path).unwrap());

        assert_eq!(target.len(), 2);
        assert_eq!(target.ttl("Sam"), NO_EXPIRY);
        assert!(target.ttl("Tom") > 290);
    }
}

//! Persistent KV Store
//!
//! 사용자 프로필당 JSON 문서 1개 (`config.json`)에 모든 설정을 저장합니다.
//!
//! - open 시 유효성 검사: 파싱 실패한 문서는 `<path>.backup.<millis>`로 격리
//! - 캐시 없음: get은 매번 파일을 읽고, set은 문서 전체를 다시 씀
//! - 쓰기는 호출별 임시 파일 + rename (부분 기록된 문서가 보이지 않음)
//! - 락 없음: 동시 set은 문서 단위로 경합하며 마지막 쓰기가 이김

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 저장소 파일 이름
pub const STORE_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store document is corrupted: {0}")]
    Corrupted(String),
}

type Document = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
    recovered_backup: Option<PathBuf>,
}

impl KvStore {
    /// 저장소 열기 (손상된 문서는 격리 후 빈 저장소로 시작)
    ///
    /// 유효성 검사 자체가 실패해도(권한, 디렉토리 등) 저장소는 만들어지고,
    /// 이후 get/set이 같은 I/O 에러를 보고합니다.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let recovered_backup = match quarantine_if_corrupted(&path) {
            Ok(backup) => backup,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "store validity check failed, continuing with unverified document"
                );
                None
            }
        };
        Self {
            path,
            recovered_backup,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// open 시 격리된 백업 파일 경로 (있으면)
    pub fn recovered_backup(&self) -> Option<&Path> {
        self.recovered_backup.as_deref()
    }

    /// 값 조회. 문서/키가 없거나 타입이 맞지 않으면 `default`
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StoreError> {
        let mut document = self.read_document()?;
        let Some(value) = document.remove(key) else {
            return Ok(default);
        };

        match serde_json::from_value(value) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value has unexpected shape, using default");
                Ok(default)
            }
        }
    }

    /// 값 저장 (문서 전체 재기록)
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set_many([(key, serde_json::to_value(value)?)])
    }

    /// 여러 키를 한 번의 문서 재기록으로 저장 (전부 반영되거나 전부 안 됨)
    pub fn set_many<'a>(
        &self,
        entries: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<(), StoreError> {
        let mut document = self.read_document()?;
        for (key, value) in entries {
            document.insert(key.to_string(), value);
        }
        self.write_document(&document)
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        parse_document(&text)
    }

    /// Atomic write: 호출마다 고유한 임시 파일에 쓰고 rename
    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let bytes = serde_json::to_vec_pretty(document)?;

        let mut file = tempfile::NamedTempFile::new_in(parent)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn parse_document(text: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Corrupted(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(StoreError::Corrupted(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 문서가 파싱되지 않으면 백업 경로로 rename
fn quarantine_if_corrupted(path: &Path) -> Result<Option<PathBuf>, StoreError> {
    let text = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let reason = match std::str::from_utf8(&text) {
        Ok(text) => match parse_document(text) {
            Ok(_) => return Ok(None),
            Err(e) => e.to_string(),
        },
        Err(e) => format!("document is not UTF-8: {}", e),
    };

    let backup_path = backup_path_for(path);
    tracing::warn!(
        path = %path.display(),
        reason = %reason,
        "detected corrupted store document, creating backup and starting fresh"
    );
    fs::rename(path, &backup_path)?;
    tracing::info!(backup = %backup_path.display(), "old store document backed up");

    Ok(Some(backup_path))
}

/// `<path>.backup.<unix-millis>` (같은 밀리초 충돌 시 접미사 증가)
fn backup_path_for(path: &Path) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut base = path.as_os_str().to_os_string();
    base.push(format!(".backup.{}", millis));

    let mut candidate = PathBuf::from(&base);
    let mut attempt = 1;
    while candidate.exists() {
        let mut next = base.clone();
        next.push(format!("-{}", attempt));
        candidate = PathBuf::from(next);
        attempt += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn backups_in(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("config.json.backup."))
            })
            .collect()
    }

    #[test]
    fn test_missing_document_returns_defaults() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path().join(STORE_FILE_NAME));

        assert!(store.recovered_backup().is_none());
        assert_eq!(store.get("monobankToken", String::new()).unwrap(), "");
        // 첫 쓰기 전에는 파일을 만들지 않음
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path().join("nested").join(STORE_FILE_NAME));

        store.set("monobankToken", "abc").unwrap();
        let mut mappings = HashMap::new();
        mappings.insert("acc1".to_string(), "asset1".to_string());
        store.set("accountMappings", &mappings).unwrap();

        assert_eq!(store.get("monobankToken", String::new()).unwrap(), "abc");
        let loaded: HashMap<String, String> = store.get("accountMappings", HashMap::new()).unwrap();
        assert_eq!(loaded, mappings);

        // 다른 핸들도 같은 문서를 봄
        let reopened = KvStore::open(store.path());
        assert_eq!(reopened.get("monobankToken", String::new()).unwrap(), "abc");
    }

    #[test]
    fn test_corrupted_document_is_quarantined() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, b"\x00\x01 encrypted-by-old-scheme {{{").unwrap();

        let store = KvStore::open(&path);

        let backups = backups_in(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(store.recovered_backup(), Some(backups[0].as_path()));
        assert_eq!(
            fs::read(&backups[0]).unwrap(),
            b"\x00\x01 encrypted-by-old-scheme {{{"
        );
        assert!(!path.exists());
        assert_eq!(store.get("lunchMoneyToken", String::new()).unwrap(), "");

        store.set("lunchMoneyToken", "fresh").unwrap();
        assert_eq!(store.get("lunchMoneyToken", String::new()).unwrap(), "fresh");
    }

    #[test]
    fn test_non_object_document_is_quarantined() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = KvStore::open(&path);
        assert!(store.recovered_backup().is_some());
        assert_eq!(backups_in(dir.path()).len(), 1);
    }

    #[test]
    fn test_valid_document_is_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, r#"{"monobankToken": "legacy"}"#).unwrap();

        let store = KvStore::open(&path);
        assert!(store.recovered_backup().is_none());
        assert!(backups_in(dir.path()).is_empty());
        assert_eq!(store.get("monobankToken", String::new()).unwrap(), "legacy");
    }

    #[test]
    fn test_wrong_shape_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, r#"{"accountMappings": "oops"}"#).unwrap();

        let store = KvStore::open(&path);
        let loaded: HashMap<String, String> = store.get("accountMappings", HashMap::new()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_corruption_after_open_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        let store = KvStore::open(&path);
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            store.get("monobankToken", String::new()),
            Err(StoreError::Corrupted(_))
        ));
    }

    #[test]
    fn test_concurrent_writers_never_fail() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path().join(STORE_FILE_NAME));

        let writers: Vec<_> = ["monobankToken", "lunchMoneyToken"]
            .into_iter()
            .map(|key| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..200)
                        .filter(|i| store.set(key, &format!("value-{}", i)).is_err())
                        .count()
                })
            })
            .collect();

        for writer in writers {
            assert_eq!(writer.join().unwrap(), 0);
        }

        let reopened = KvStore::open(store.path());
        assert!(reopened.recovered_backup().is_none());
        assert!(backups_in(dir.path()).is_empty());
        // 마지막 쓰기가 이긴 문서는 항상 온전한 JSON
        let value = reopened.get("monobankToken", String::new()).unwrap();
        assert!(value.is_empty() || value.starts_with("value-"));
    }

    #[test]
    fn test_set_many_writes_all_keys_at_once() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path().join(STORE_FILE_NAME));
        store.set("accountMappings", &HashMap::from([("a", "b")])).unwrap();

        store
            .set_many([
                ("monobankToken", Value::from("m")),
                ("lunchMoneyToken", Value::from("l")),
            ])
            .unwrap();

        assert_eq!(store.get("monobankToken", String::new()).unwrap(), "m");
        assert_eq!(store.get("lunchMoneyToken", String::new()).unwrap(), "l");
        let mappings: HashMap<String, String> = store.get("accountMappings", HashMap::new()).unwrap();
        assert_eq!(mappings.get("a").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_unreadable_document_does_not_fail_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::create_dir_all(&path).unwrap();

        let store = KvStore::open(&path);

        assert!(store.recovered_backup().is_none());
        assert!(matches!(
            store.get("monobankToken", String::new()),
            Err(StoreError::Io(_))
        ));
        assert!(store.set("monobankToken", "x").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_keeps_non_utf8_file_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let name = OsStr::from_bytes(b"conf\xffig.json");
        let path = dir.path().join(name);
        fs::write(&path, "{ broken").unwrap();

        let store = KvStore::open(&path);

        let backup = store.recovered_backup().unwrap();
        assert_eq!(backup.parent(), Some(dir.path()));
        assert!(backup
            .file_name()
            .unwrap()
            .as_bytes()
            .starts_with(b"conf\xffig.json.backup."));
        assert!(backup.exists());
    }
}

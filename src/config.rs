//! 앱 설정
//!
//! `.env` (있으면) → 환경 변수 순으로 읽습니다.
//! - `MONOLUNCH_PORT`: 게이트웨이 포트 (기본 3000)
//! - `MONOLUNCH_DATA_DIR`: 설정 문서 디렉토리 (기본 `<data_dir>/MonoLunch`)
//!
//! 업스트림 base URL은 설정 대상이 아닙니다.

use std::path::PathBuf;

use crate::store::STORE_FILE_NAME;

pub const DEFAULT_PORT: u16 = 3000;
const APP_DIR_NAME: &str = "MonoLunch";

const ENV_PORT: &str = "MONOLUNCH_PORT";
const ENV_DATA_DIR: &str = "MONOLUNCH_DATA_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine the user data directory; set MONOLUNCH_DATA_DIR")]
    DataDirNotFound,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드 (`.env`가 없으면 무시)
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to load .env, ignoring");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::data_dir())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        default_data_root: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let port = match lookup(ENV_PORT) {
            Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(value = %raw, "invalid {}, using default {}", ENV_PORT, DEFAULT_PORT);
                    DEFAULT_PORT
                }
            },
            _ => DEFAULT_PORT,
        };

        let data_dir = match lookup(ENV_DATA_DIR) {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => default_data_root
                .ok_or(ConfigError::DataDirNotFound)?
                .join(APP_DIR_NAME),
        };

        Ok(Self { port, data_dir })
    }

    /// KV 문서 경로
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]), Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.data_dir, PathBuf::from("/data").join("MonoLunch"));
        assert_eq!(
            config.store_path(),
            PathBuf::from("/data").join("MonoLunch").join("config.json")
        );
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(
            lookup(&[(ENV_PORT, "4123"), (ENV_DATA_DIR, "/tmp/monolunch")]),
            None,
        )
        .unwrap();
        assert_eq!(config.port, 4123);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/monolunch"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config =
            AppConfig::from_lookup(lookup(&[(ENV_PORT, "http")]), Some(PathBuf::from("/d"))).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_missing_data_dir() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[]), None),
            Err(ConfigError::DataDirNotFound)
        ));
    }
}

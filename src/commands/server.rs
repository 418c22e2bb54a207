//! 게이트웨이 정보 명령어

use crate::config::AppConfig;

/// UI가 호출할 게이트웨이 base URL
pub fn get_base_url(config: &AppConfig) -> String {
    format!("http://localhost:{}", config.port)
}

//! UI 프로세스 경계 명령어
//!
//! UI 쪽 IPC 핸들러가 동기적으로 호출하는 함수들입니다.

pub mod mappings;
pub mod server;
pub mod tokens;

pub use mappings::{load_account_mappings, save_account_mappings};
pub use server::get_base_url;
pub use tokens::{load_tokens, save_tokens};

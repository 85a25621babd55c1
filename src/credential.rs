//! API 密钥加载
//!
//! 从本地文件读取语言模型服务的密钥。文件不存在或内容为空都视为
//! 启动失败，不做重试。

use std::fmt;
use std::path::Path;

use tracing::{debug, error};

use crate::error::StartupError;

/// 语言模型服务的 API 密钥
///
/// `Debug` 和 `Display` 都不会输出密钥本身。
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 返回原始密钥，仅用于构造请求
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// 读取并去除首尾空白
pub fn load_api_key(path: &Path) -> Result<ApiKey, StartupError> {
    let missing = || StartupError::MissingCredential {
        path: path.to_path_buf(),
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!(path = %path.display(), "API key file not found");
            return Err(missing());
        }
        Err(e) => return Err(StartupError::Io(e)),
    };

    let key = raw.trim();
    if key.is_empty() {
        error!(path = %path.display(), "API key file is empty");
        return Err(missing());
    }

    debug!(path = %path.display(), "API key loaded");
    Ok(ApiKey::new(key))
}

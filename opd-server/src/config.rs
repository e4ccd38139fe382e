//! 配置管理
//!
//! 内置默认值 < 可选配置文件 < OPD_前缀环境变量，逐层覆盖。

use config::{Config, Environment, File};
use opd_core::{OpdError, Result};
use opd_workflow::CredentialTable;
use serde::{Deserialize, Serialize};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// OPD系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpdConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 角色凭据表
    pub auth: CredentialTable,
}

impl OpdConfig {
    /// 加载配置
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        builder
            .add_source(Environment::with_prefix("OPD").separator("__"))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| OpdError::Config(e.to_string()))
    }
}

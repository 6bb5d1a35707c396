// src/config.rs
//
// 应用配置：服务端地址与若干时长参数，JSON 持久化在平台配置目录

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_server_base_url() -> String {
    // 原始设备的 mDNS 主机名与默认端口
    "http://clipboard-dongle.local:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_banner_secs() -> u64 {
    3
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// 桥接服务端基地址（/replacements 与 /submit 的共同前缀）
    #[serde(default = "default_server_base_url")]
    pub server_base_url: String,
    /// 网络请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 瞬态横幅展示时长（秒）
    #[serde(default = "default_banner_secs")]
    pub banner_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_base_url: default_server_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            banner_secs: default_banner_secs(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn banner_ttl(&self) -> Duration {
        Duration::from_secs(self.banner_secs)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法获取配置目录"))?;
        let app_dir = config_dir.join("AsciiBridge");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置: {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // 配置损坏时退回默认值，不让启动失败
                tracing::warn!("解析配置失败，退回默认配置: {}", e);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::info!("配置已保存: {:?}", path);
        Ok(())
    }
}

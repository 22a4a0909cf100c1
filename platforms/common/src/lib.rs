use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// 推送平台错误类型
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Read body error: {0}")]
    ReadBody(String),

    /// 响应体无法解析, 保留原始响应体便于排查
    #[error("Decode error: {reason}, body: {body}")]
    Decode { body: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// 机器人接口返回的状态
///
/// `errcode` 非 0 时原样返回给调用方, 不视为本地错误。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub errcode: i64,
    pub errmsg: String,
}

impl SendResult {
    pub fn is_success(&self) -> bool {
        self.errcode == 0
    }
}

/// 中转推送结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResult {
    /// 请求是否送达并成功解析响应
    pub success: bool,
    /// 平台返回的状态
    pub response: Option<SendResult>,
    /// 错误信息
    pub error: Option<String>,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
}

impl Default for PushResult {
    fn default() -> Self {
        Self {
            success: false,
            response: None,
            error: None,
            timestamp: Utc::now(),
        }
    }
}

impl PushResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

impl From<Result<SendResult, PushError>> for PushResult {
    fn from(outcome: Result<SendResult, PushError>) -> Self {
        match outcome {
            Ok(response) => Self {
                success: true,
                response: Some(response),
                ..Default::default()
            },
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// 初始化配置trait
pub trait PushInitConfig: Send + Sync {
    /// 获取平台名称
    fn platform_name(&self) -> &str;

    /// 获取webhook URL
    fn webhook_url(&self) -> &str;

    /// 获取超时时间
    fn timeout(&self) -> Duration;
}

/// 推送平台trait
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// 发送平台格式的 JSON 消息, 先校验消息类型
    async fn push(&self, message: Value) -> Result<SendResult, PushError>;

    /// 获取平台信息
    fn platform_info(&self) -> PlatformInfo;
}

/// 平台信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// 平台名称
    pub name: String,
    /// 版本
    pub version: String,
    /// 支持的消息类型
    pub message_types: Vec<String>,
}

/// 平台工厂trait
pub trait PlatformFactory: Send + Sync {
    /// 根据JSON Value创建平台实例
    fn create(&self, config: Value) -> Result<Box<dyn PushPlatform>, PushError>;

    /// 获取平台名称
    fn name(&self) -> &'static str;
}

/// 平台注册表
#[derive(Default)]
pub struct PlatformRegistry {
    factories: HashMap<String, Box<dyn PlatformFactory>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册平台工厂, 同名覆盖
    pub fn register(&mut self, factory: Box<dyn PlatformFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    pub fn get_factory(&self, name: &str) -> Option<&dyn PlatformFactory> {
        self.factories.get(name).map(|f| f.as_ref())
    }

    /// 获取所有支持的平台名称
    pub fn list_platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

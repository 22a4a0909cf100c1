use async_trait::async_trait;
use common::{
    PlatformFactory, PlatformInfo, PushError, PushInitConfig, PushPlatform, SendResult,
};
use log::*;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

mod message;

pub use message::{
    ActionButton, ActionCard, ActionCardMessage, At, BtnOrientation, FeedCard, FeedCardMessage,
    FeedLink, Link, LinkMessage, Markdown, MarkdownMessage, Message, MessageBuilder,
    SingleActionCard, SingleActionCardMessage, Text, TextMessage,
};

const PLATFORM_NAME: &str = "dingtalk";
const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// 单次请求的超时时间, 不可由调用方覆盖
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(6);

/// 钉钉机器人配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DingTalkConfig {
    pub webhook: String,
}

impl PushInitConfig for DingTalkConfig {
    fn platform_name(&self) -> &str {
        PLATFORM_NAME
    }

    fn webhook_url(&self) -> &str {
        &self.webhook
    }

    fn timeout(&self) -> Duration {
        REQUEST_TIMEOUT
    }
}

/// 钉钉群机器人
///
/// 构造后不可变, 多个实例之间不共享任何状态。
#[derive(Debug, Clone)]
pub struct DingTalkRobot {
    config: DingTalkConfig,
    http_client: Client,
}

impl DingTalkRobot {
    /// 原样保存 webhook 地址, 不做校验
    pub fn new(webhook: impl Into<String>) -> Self {
        Self::with_config(DingTalkConfig {
            webhook: webhook.into(),
        })
    }

    /// 每个地址创建一个独立的机器人
    pub fn new_many<I, S>(webhooks: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        webhooks.into_iter().map(Self::new).collect()
    }

    pub fn with_config(config: DingTalkConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    pub fn webhook(&self) -> &str {
        self.config.webhook_url()
    }

    /// 发送消息, 返回钉钉的 `errcode`/`errmsg`
    ///
    /// 非 0 的 `errcode` 原样返回, 不转换为错误。
    pub async fn send(&self, message: &Message) -> Result<SendResult, PushError> {
        let payload = serde_json::to_vec(message)
            .map_err(|e| PushError::Serialize(format!("{} message: {e}", message.msgtype())))?;

        debug!(
            "Sending {} message to {}",
            message.msgtype(),
            self.config.webhook_url()
        );

        let response = self
            .http_client
            .post(self.config.webhook_url())
            .timeout(self.config.timeout())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                warn!("DingTalk request to {} failed: {e}", self.config.webhook_url());
                if e.is_timeout() {
                    PushError::Timeout(e.to_string())
                } else if e.is_builder() {
                    PushError::Request(e.to_string())
                } else {
                    PushError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                PushError::Timeout(e.to_string())
            } else {
                PushError::ReadBody(e.to_string())
            }
        })?;

        serde_json::from_str::<SendResult>(&text).map_err(|e| {
            warn!("Undecodable DingTalk response, status: {status}, body: {text}");
            PushError::Decode {
                body: text.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// 校验 JSON 消息类型后发送
    pub async fn send_value(&self, message: Value) -> Result<SendResult, PushError> {
        let message = Message::from_value(message)?;
        self.send(&message).await
    }
}

#[async_trait]
impl PushPlatform for DingTalkRobot {
    async fn push(&self, message: Value) -> Result<SendResult, PushError> {
        self.send_value(message).await
    }

    fn platform_info(&self) -> PlatformInfo {
        PlatformInfo {
            name: PLATFORM_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            message_types: [
                message::TEXT,
                message::LINK,
                message::MARKDOWN,
                message::ACTION_CARD,
                message::FEED_CARD,
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        }
    }
}

// --- Platform Factory ---

pub struct DingTalkPlatformFactory;

impl PlatformFactory for DingTalkPlatformFactory {
    fn create(&self, config: Value) -> Result<Box<dyn PushPlatform>, PushError> {
        let config: DingTalkConfig =
            serde_json::from_value(config).map_err(|e| PushError::Config(e.to_string()))?;
        Ok(Box::new(DingTalkRobot::with_config(config)))
    }

    fn name(&self) -> &'static str {
        PLATFORM_NAME
    }
}

use common::PushResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 推送请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    /// 已注册的平台名, 目前只有 `dingtalk`
    pub platform: String,
    /// 交给平台工厂解析的配置, 钉钉为 `{"webhook": "<机器人地址>"}`
    pub config: Value,
    /// 平台格式的消息, 由平台自行校验消息类型
    pub message: Value,
}

/// 推送响应体, 平台返回的 errcode 原样放在 `result.response` 中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    /// 推送结果
    pub result: PushResult,
}

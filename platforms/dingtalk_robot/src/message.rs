use common::PushError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const TEXT: &str = "text";
pub const LINK: &str = "link";
pub const MARKDOWN: &str = "markdown";
pub const ACTION_CARD: &str = "actionCard";
pub const FEED_CARD: &str = "feedCard";

/// 钉钉机器人消息
///
/// 整体卡片和独立跳转卡片共用 `actionCard` 类型, 反序列化时以 `btns` 是否存在且非 null 区分。
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(TextMessage),
    Link(LinkMessage),
    Markdown(MarkdownMessage),
    SingleActionCard(SingleActionCardMessage),
    ActionCard(ActionCardMessage),
    FeedCard(FeedCardMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<At>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

/// @ 设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct At {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub at_mobiles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub at_user_ids: Vec<String>,
    #[serde(default)]
    pub is_at_all: bool,
}

impl At {
    fn is_empty(&self) -> bool {
        self.at_mobiles.is_empty() && self.at_user_ids.is_empty() && !self.is_at_all
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMessage {
    pub link: Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub title: String,
    pub text: String,
    pub message_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pic_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownMessage {
    pub markdown: Markdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<At>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markdown {
    pub title: String,
    pub text: String,
}

/// 按钮排列方向, "0" 竖直 "1" 横向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BtnOrientation {
    #[default]
    #[serde(rename = "0")]
    Vertical,
    #[serde(rename = "1")]
    Horizontal,
}

/// 整体跳转 ActionCard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleActionCardMessage {
    #[serde(rename = "actionCard")]
    pub action_card: SingleActionCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleActionCard {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub btn_orientation: BtnOrientation,
    pub single_title: String,
    #[serde(rename = "singleURL")]
    pub single_url: String,
}

/// 独立跳转 ActionCard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCardMessage {
    #[serde(rename = "actionCard")]
    pub action_card: ActionCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCard {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub btn_orientation: BtnOrientation,
    pub btns: Vec<ActionButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionButton {
    pub title: String,
    #[serde(rename = "actionURL")]
    pub action_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedCardMessage {
    #[serde(rename = "feedCard")]
    pub feed_card: FeedCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedCard {
    pub links: Vec<FeedLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedLink {
    pub title: String,
    #[serde(rename = "messageURL")]
    pub message_url: String,
    #[serde(rename = "picURL")]
    pub pic_url: String,
}

impl Message {
    pub fn text(content: impl Into<String>) -> Self {
        Message::Text(TextMessage {
            text: Text {
                content: content.into(),
            },
            at: None,
        })
    }

    pub fn link(
        title: impl Into<String>,
        text: impl Into<String>,
        message_url: impl Into<String>,
        pic_url: Option<String>,
    ) -> Self {
        Message::Link(LinkMessage {
            link: Link {
                title: title.into(),
                text: text.into(),
                message_url: message_url.into(),
                pic_url,
            },
        })
    }

    pub fn markdown(title: impl Into<String>, text: impl Into<String>) -> Self {
        Message::Markdown(MarkdownMessage {
            markdown: Markdown {
                title: title.into(),
                text: text.into(),
            },
            at: None,
        })
    }

    pub fn single_action_card(
        title: impl Into<String>,
        text: impl Into<String>,
        single_title: impl Into<String>,
        single_url: impl Into<String>,
    ) -> Self {
        Message::SingleActionCard(SingleActionCardMessage {
            action_card: SingleActionCard {
                title: title.into(),
                text: text.into(),
                btn_orientation: BtnOrientation::default(),
                single_title: single_title.into(),
                single_url: single_url.into(),
            },
        })
    }

    pub fn action_card(
        title: impl Into<String>,
        text: impl Into<String>,
        btn_orientation: BtnOrientation,
        btns: Vec<ActionButton>,
    ) -> Self {
        Message::ActionCard(ActionCardMessage {
            action_card: ActionCard {
                title: title.into(),
                text: text.into(),
                btn_orientation,
                btns,
            },
        })
    }

    pub fn feed_card(links: Vec<FeedLink>) -> Self {
        Message::FeedCard(FeedCardMessage {
            feed_card: FeedCard { links },
        })
    }

    /// 消息的 `msgtype` 字段
    pub fn msgtype(&self) -> &'static str {
        match self {
            Message::Text(_) => TEXT,
            Message::Link(_) => LINK,
            Message::Markdown(_) => MARKDOWN,
            Message::SingleActionCard(_) | Message::ActionCard(_) => ACTION_CARD,
            Message::FeedCard(_) => FEED_CARD,
        }
    }

    /// 从未类型化的 JSON 解析消息, 未知的 `msgtype` 返回 `InvalidMessage`
    pub fn from_value(value: Value) -> Result<Self, PushError> {
        let msgtype = match value.get("msgtype").and_then(Value::as_str) {
            Some(msgtype) => msgtype.to_string(),
            None => {
                return Err(PushError::InvalidMessage(format!(
                    "missing msgtype: {value}"
                )));
            }
        };

        let parsed = match msgtype.as_str() {
            TEXT => serde_json::from_value(value).map(Message::Text),
            LINK => serde_json::from_value(value).map(Message::Link),
            MARKDOWN => serde_json::from_value(value).map(Message::Markdown),
            ACTION_CARD
                if value
                    .pointer("/actionCard/btns")
                    .is_some_and(|btns| !btns.is_null()) =>
            {
                serde_json::from_value(value).map(Message::ActionCard)
            }
            ACTION_CARD => serde_json::from_value(value).map(Message::SingleActionCard),
            FEED_CARD => serde_json::from_value(value).map(Message::FeedCard),
            other => {
                return Err(PushError::InvalidMessage(format!(
                    "unknown msgtype '{other}'"
                )));
            }
        };

        parsed.map_err(|e| PushError::InvalidMessage(format!("malformed {msgtype} message: {e}")))
    }
}

/// 序列化时在消息体前补上 `msgtype`
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    msgtype: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let msgtype = self.msgtype();
        match self {
            Message::Text(body) => Envelope { msgtype, body }.serialize(serializer),
            Message::Link(body) => Envelope { msgtype, body }.serialize(serializer),
            Message::Markdown(body) => Envelope { msgtype, body }.serialize(serializer),
            Message::SingleActionCard(body) => Envelope { msgtype, body }.serialize(serializer),
            Message::ActionCard(body) => Envelope { msgtype, body }.serialize(serializer),
            Message::FeedCard(body) => Envelope { msgtype, body }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Message::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// 带 @ 设置的消息构建器, 仅文本和 Markdown 消息支持 @
pub struct MessageBuilder {
    message: Message,
    at: At,
}

impl MessageBuilder {
    /// 创建文本消息构建器
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: Message::text(content),
            at: At::default(),
        }
    }

    /// 创建Markdown消息构建器
    pub fn markdown(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message: Message::markdown(title, text),
            at: At::default(),
        }
    }

    /// 按手机号 @
    pub fn mention_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.at.at_mobiles.push(mobile.into());
        self
    }

    /// 按用户 ID @
    pub fn mention_user(mut self, user_id: impl Into<String>) -> Self {
        self.at.at_user_ids.push(user_id.into());
        self
    }

    /// @所有人
    pub fn at_all(mut self) -> Self {
        self.at.is_at_all = true;
        self
    }

    /// 构建消息
    pub fn build(self) -> Message {
        let at = (!self.at.is_empty()).then_some(self.at);
        match self.message {
            Message::Text(msg) => Message::Text(TextMessage { at, ..msg }),
            Message::Markdown(msg) => Message::Markdown(MarkdownMessage { at, ..msg }),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message_shape() {
        let value = serde_json::to_value(Message::text("deploy finished")).unwrap();
        assert_eq!(
            value,
            json!({"msgtype": "text", "text": {"content": "deploy finished"}})
        );
    }

    #[test]
    fn test_builder_mentions() {
        let msg = MessageBuilder::text("on call")
            .mention_mobile("13800000000")
            .mention_user("user123")
            .build();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "msgtype": "text",
                "text": {"content": "on call"},
                "at": {"atMobiles": ["13800000000"], "atUserIds": ["user123"], "isAtAll": false}
            })
        );

        let msg = MessageBuilder::markdown("Alert", "# disk full").at_all().build();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["at"], json!({"isAtAll": true}));
        assert_eq!(value["markdown"]["title"], "Alert");
    }

    #[test]
    fn test_link_message_shape() {
        let msg = Message::link(
            "Release",
            "v1.2.0 is out",
            "https://example.com/release",
            Some("https://example.com/logo.png".to_string()),
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "msgtype": "link",
                "link": {
                    "title": "Release",
                    "text": "v1.2.0 is out",
                    "messageUrl": "https://example.com/release",
                    "picUrl": "https://example.com/logo.png"
                }
            })
        );
    }

    #[test]
    fn test_action_card_shapes() {
        let single = Message::single_action_card(
            "Build",
            "build #42 failed",
            "View",
            "https://ci.example.com/42",
        );
        let value = serde_json::to_value(&single).unwrap();
        assert_eq!(
            value,
            json!({
                "msgtype": "actionCard",
                "actionCard": {
                    "title": "Build",
                    "text": "build #42 failed",
                    "btnOrientation": "0",
                    "singleTitle": "View",
                    "singleURL": "https://ci.example.com/42"
                }
            })
        );

        let multi = Message::action_card(
            "Review",
            "approve?",
            BtnOrientation::Horizontal,
            vec![
                ActionButton {
                    title: "Yes".to_string(),
                    action_url: "https://example.com/yes".to_string(),
                },
                ActionButton {
                    title: "No".to_string(),
                    action_url: "https://example.com/no".to_string(),
                },
            ],
        );
        let value = serde_json::to_value(&multi).unwrap();
        assert_eq!(value["msgtype"], "actionCard");
        assert_eq!(value["actionCard"]["btnOrientation"], "1");
        assert_eq!(value["actionCard"]["btns"][1]["actionURL"], "https://example.com/no");
    }

    #[test]
    fn test_feed_card_shape() {
        let msg = Message::feed_card(vec![FeedLink {
            title: "News".to_string(),
            message_url: "https://example.com/a".to_string(),
            pic_url: "https://example.com/a.png".to_string(),
        }]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "msgtype": "feedCard",
                "feedCard": {"links": [{
                    "title": "News",
                    "messageURL": "https://example.com/a",
                    "picURL": "https://example.com/a.png"
                }]}
            })
        );
    }

    #[test]
    fn test_from_value_distinguishes_action_cards() {
        let single = Message::from_value(json!({
            "msgtype": "actionCard",
            "actionCard": {"title": "t", "text": "x", "singleTitle": "go", "singleURL": "https://a"}
        }))
        .unwrap();
        assert!(matches!(single, Message::SingleActionCard(_)));

        let multi = Message::from_value(json!({
            "msgtype": "actionCard",
            "actionCard": {"title": "t", "text": "x", "btns": []}
        }))
        .unwrap();
        assert!(matches!(multi, Message::ActionCard(_)));

        let null_btns = Message::from_value(json!({
            "msgtype": "actionCard",
            "actionCard": {
                "title": "t", "text": "x", "btns": null,
                "singleTitle": "go", "singleURL": "https://a"
            }
        }))
        .unwrap();
        assert!(matches!(null_btns, Message::SingleActionCard(_)));
    }

    #[test]
    fn test_from_value_unknown_msgtype() {
        let err = Message::from_value(json!({"msgtype": "image", "image": {}})).unwrap_err();
        assert!(matches!(err, PushError::InvalidMessage(_)));
        assert!(err.to_string().contains("image"));

        let err = Message::from_value(json!({"text": {"content": "hi"}})).unwrap_err();
        assert!(matches!(err, PushError::InvalidMessage(_)));
    }

    #[test]
    fn test_from_value_malformed_body() {
        let err = Message::from_value(json!({"msgtype": "markdown", "markdown": {"title": "t"}}))
            .unwrap_err();
        assert!(matches!(err, PushError::InvalidMessage(_)));
    }

    #[test]
    fn test_deserialize_matches_serialize() {
        let msg = MessageBuilder::markdown("Weekly", "**all green**")
            .mention_user("ops")
            .build();
        let json = serde_json::to_string(&msg).unwrap();
        let decoded: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.msgtype(), MARKDOWN);
    }
}

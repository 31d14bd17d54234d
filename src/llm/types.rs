use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Ids of every tool-use block in this message, in order.
    pub fn tool_use_ids(&self) -> Vec<&str> {
        self.blocks()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Ids referenced by tool-result blocks in this message, in order.
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.blocks()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect()
    }

    fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            MessageContent::Text(_) => &[],
            MessageContent::Blocks(blocks) => blocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<ContentBlock>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn png_base64(data: String) -> Self {
        Self {
            source_type: "base64".into(),
            media_type: "image/png".into(),
            data,
        }
    }
}

/// A custom tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Payload of one remote call.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub tools: Vec<ToolDef>,
    pub messages: Vec<Message>,
}

/// One content block of a model response. Only text and tool use are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

impl From<ResponseBlock> for ContentBlock {
    fn from(block: ResponseBlock) -> Self {
        match block {
            ResponseBlock::Text { text } => ContentBlock::Text { text },
            ResponseBlock::ToolUse { id, name, input } => ContentBlock::ToolUse { id, name, input },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl AssistantResponse {
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ResponseBlock::ToolUse { .. }))
    }

    /// All text blocks joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ResponseBlock::Text { text } => Some(text.trim()),
                ResponseBlock::ToolUse { .. } => None,
            })
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Convert into a history message, keeping every block verbatim.
    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(self.content.into_iter().map(Into::into).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_message_serializes_as_string() {
        let msg = Message::user_text("open the browser");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "open the browser"})
        );
    }

    #[test]
    fn tool_result_serializes_in_wire_shape() {
        let msg = Message {
            role: Role::User,
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_1".into(),
                content: vec![
                    ContentBlock::Text { text: "shot".into() },
                    ContentBlock::Image {
                        source: ImageSource::png_base64("AAAA".into()),
                    },
                ],
            }]),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "toolu_1",
                    "content": [
                        {"type": "text", "text": "shot"},
                        {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "AAAA"}}
                    ]
                }]
            })
        );
        assert_eq!(msg.tool_result_ids(), vec!["toolu_1"]);
    }

    #[test]
    fn response_parses_and_converts_to_history() {
        let response: AssistantResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude",
            "content": [
                {"type": "text", "text": "Clicking now."},
                {"type": "tool_use", "id": "toolu_9", "name": "computer", "input": {"action": "left_click"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 1, "output_tokens": 2}
        }))
        .unwrap();

        assert!(response.has_tool_use());
        assert_eq!(response.text(), "Clicking now.");

        let msg = response.into_message();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.tool_use_ids(), vec!["toolu_9"]);
    }

    #[test]
    fn unknown_block_kind_is_rejected() {
        let parsed = serde_json::from_value::<AssistantResponse>(json!({
            "role": "assistant",
            "content": [{"type": "hologram", "data": 1}]
        }));
        assert!(parsed.is_err());
    }
}

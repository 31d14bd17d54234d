//! Translation between the model's tool-use protocol and [`Action`]s.
//!
//! Outbound, the conversation becomes a [`MessageRequest`] carrying the fixed
//! system instruction and two-tool manifest. Inbound, a response is reduced to
//! exactly one validated action taken from its first tool-use block.

use base64::Engine as _;
use serde_json::{json, Value};

use crate::agent_engine::event_bus::Notification;
use crate::agent_engine::history::Conversation;
use crate::agent_engine::state::{Action, ClickKind};
use crate::errors::ProtocolError;
use crate::llm::tools::{COMPUTER_TOOL, FINISH_TOOL};
use crate::llm::types::{
    AssistantResponse, ContentBlock, ImageSource, Message, MessageContent, MessageRequest,
    ResponseBlock, Role, ToolDef,
};

pub const SCREENSHOT_RESULT_TEXT: &str = "Here is a screenshot after the action was executed";
pub const NO_INSTRUCTION_PREFIX: &str = "model returned no actionable instruction";

const INVALID_COORDINATE: &str = "Invalid coordinate for mouse action";
const MISSING_TEXT: &str = "Missing text for keyboard action";

/// The action chosen from a response plus the id the next tool result must reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub action: Action,
    pub tool_use_id: String,
}

/// Builds requests for one session. The system instruction and tool manifest
/// are fixed at construction and never change between calls.
#[derive(Debug, Clone)]
pub struct Translator {
    model: String,
    max_tokens: u32,
    system: String,
    tools: Vec<ToolDef>,
}

impl Translator {
    pub fn new(model: String, max_tokens: u32, system: String, tools: Vec<ToolDef>) -> Self {
        Self {
            model,
            max_tokens,
            system,
            tools,
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn build_request(&self, conversation: &Conversation) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: self.system.clone(),
            tools: self.tools.clone(),
            messages: conversation.messages().to_vec(),
        }
    }
}

/// Reduce a model response to a single action.
///
/// A response without any tool use gets a synthetic `finish` tool-use block
/// appended in place, so the stored assistant turn can still be paired with a
/// tool result.
pub fn extract_action(response: &mut AssistantResponse) -> Result<Extraction, ProtocolError> {
    if !response.has_tool_use() {
        let error = format!("{NO_INSTRUCTION_PREFIX}: {}", response.text());
        let id = format!("toolu_synthetic_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(error = %error, "text-only response, appending synthetic finish");
        response.content.push(ResponseBlock::ToolUse {
            id: id.clone(),
            name: FINISH_TOOL.into(),
            input: json!({ "success": false, "error": error }),
        });
        return Ok(Extraction {
            action: Action::Finish {
                success: false,
                error: Some(error),
            },
            tool_use_id: id,
        });
    }

    let (id, name, input) = response
        .content
        .iter()
        .find_map(|b| match b {
            ResponseBlock::ToolUse { id, name, input } => Some((id, name, input)),
            ResponseBlock::Text { .. } => None,
        })
        .ok_or_else(|| ProtocolError::MalformedResponse("no tool use block".into()))?;

    let action = match name.as_str() {
        FINISH_TOOL => parse_finish(input)?,
        COMPUTER_TOOL => parse_computer(input)?,
        other => return Err(ProtocolError::UnexpectedTool(other.to_string())),
    };

    tracing::debug!(tool = %name, id = %id, ?action, "extracted action");
    Ok(Extraction {
        action,
        tool_use_id: id.clone(),
    })
}

fn parse_finish(input: &Value) -> Result<Action, ProtocolError> {
    let success = input
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| ProtocolError::InvalidAction("Missing success for finish".into()))?;
    let error = input.get("error").and_then(Value::as_str).map(str::to_string);
    Ok(Action::Finish { success, error })
}

fn parse_computer(input: &Value) -> Result<Action, ProtocolError> {
    let action = input
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::InvalidAction("Missing action for computer tool".into()))?;

    match action {
        "mouse_move" | "left_click_drag" => {
            let (x, y) = coordinate(input)?;
            if action == "mouse_move" {
                Ok(Action::MouseMove { x, y })
            } else {
                Ok(Action::Drag { x, y })
            }
        }
        "left_click" => Ok(Action::Click { kind: ClickKind::Left }),
        "right_click" => Ok(Action::Click { kind: ClickKind::Right }),
        "middle_click" => Ok(Action::Click { kind: ClickKind::Middle }),
        "double_click" => Ok(Action::Click { kind: ClickKind::Double }),
        "screenshot" => Ok(Action::Screenshot),
        "cursor_position" => Ok(Action::CursorPosition),
        "type" => Ok(Action::TypeText { text: text(input)? }),
        "key" => Ok(Action::KeyPress { key: text(input)? }),
        other => Err(ProtocolError::UnsupportedAction(other.to_string())),
    }
}

fn coordinate(input: &Value) -> Result<(f64, f64), ProtocolError> {
    let invalid = || ProtocolError::InvalidAction(INVALID_COORDINATE.into());
    match input.get("coordinate").and_then(Value::as_array).map(Vec::as_slice) {
        Some([x, y]) => Ok((x.as_f64().ok_or_else(invalid)?, y.as_f64().ok_or_else(invalid)?)),
        _ => Err(invalid()),
    }
}

fn text(input: &Value) -> Result<String, ProtocolError> {
    input
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProtocolError::InvalidAction(MISSING_TEXT.into()))
}

/// The user turn answering `tool_use_id`: fixed text plus the PNG screenshot.
pub fn tool_result_message(tool_use_id: &str, screenshot_png: &[u8]) -> Message {
    let data = base64::engine::general_purpose::STANDARD.encode(screenshot_png);
    Message {
        role: Role::User,
        content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
            tool_use_id: tool_use_id.to_string(),
            content: vec![
                ContentBlock::Text {
                    text: SCREENSHOT_RESULT_TEXT.into(),
                },
                ContentBlock::Image {
                    source: ImageSource::png_base64(data),
                },
            ],
        }]),
    }
}

/// Human-readable projection of a response, one notification per block.
pub fn project(response: &AssistantResponse) -> Vec<Notification> {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => {
                let text = text.trim();
                (!text.is_empty()).then(|| Notification::Assistant(text.to_string()))
            }
            ResponseBlock::ToolUse { name, input, .. } => {
                Some(Notification::ActionPerformed(action_summary(name, input)))
            }
        })
        .collect()
}

fn action_summary(name: &str, input: &Value) -> Value {
    match name {
        COMPUTER_TOOL => {
            let coord = input.get("coordinate").and_then(Value::as_array);
            json!({
                "type": input.get("action"),
                "x": coord.and_then(|c| c.first()),
                "y": coord.and_then(|c| c.get(1)),
                "text": input.get("text"),
            })
        }
        FINISH_TOOL => json!({
            "type": FINISH_TOOL,
            "success": input.get("success"),
            "error": input.get("error"),
        }),
        other => json!({ "type": other, "input": input }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::load_builtin_tools;

    fn response(blocks: Vec<ResponseBlock>) -> AssistantResponse {
        AssistantResponse {
            id: Some("msg_test".into()),
            role: Role::Assistant,
            content: blocks,
            stop_reason: Some("tool_use".into()),
        }
    }

    fn tool(id: &str, name: &str, input: Value) -> ResponseBlock {
        ResponseBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    fn computer(input: Value) -> Result<Extraction, ProtocolError> {
        extract_action(&mut response(vec![tool("toolu_1", "computer", input)]))
    }

    #[test]
    fn text_only_response_becomes_synthetic_finish() {
        let mut resp = response(vec![ResponseBlock::Text {
            text: "Which browser should I use?".into(),
        }]);
        let extraction = extract_action(&mut resp).unwrap();

        match &extraction.action {
            Action::Finish { success, error } => {
                assert!(!success);
                let error = error.as_deref().unwrap();
                assert!(error.starts_with(NO_INSTRUCTION_PREFIX));
                assert!(error.contains("Which browser should I use?"));
            }
            other => panic!("expected finish, got {other:?}"),
        }

        assert_eq!(resp.content.len(), 2);
        match &resp.content[1] {
            ResponseBlock::ToolUse { id, name, input } => {
                assert_eq!(name, "finish");
                assert_eq!(id, &extraction.tool_use_id);
                assert_eq!(input["success"], json!(false));
            }
            other => panic!("expected synthetic tool use, got {other:?}"),
        }
    }

    #[test]
    fn first_tool_use_wins() {
        let mut resp = response(vec![
            ResponseBlock::Text { text: "Moving first.".into() },
            tool("toolu_a", "computer", json!({"action": "mouse_move", "coordinate": [10, 20]})),
            tool("toolu_b", "computer", json!({"action": "left_click"})),
        ]);
        let extraction = extract_action(&mut resp).unwrap();
        assert_eq!(extraction.tool_use_id, "toolu_a");
        assert_eq!(extraction.action, Action::MouseMove { x: 10.0, y: 20.0 });
        assert_eq!(resp.content.len(), 3);
    }

    #[test]
    fn finish_reads_success_and_optional_error() {
        let ok = extract_action(&mut response(vec![tool("t", "finish", json!({"success": true}))]))
            .unwrap();
        assert_eq!(ok.action, Action::Finish { success: true, error: None });

        let failed = extract_action(&mut response(vec![tool(
            "t",
            "finish",
            json!({"success": false, "error": "page not found"}),
        )]))
        .unwrap();
        assert_eq!(
            failed.action,
            Action::Finish {
                success: false,
                error: Some("page not found".into())
            }
        );

        let missing = extract_action(&mut response(vec![tool("t", "finish", json!({}))]));
        assert!(matches!(missing, Err(ProtocolError::InvalidAction(_))));
    }

    #[test]
    fn mouse_actions_need_two_coordinates() {
        let err = computer(json!({"action": "mouse_move", "coordinate": [5]})).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAction(INVALID_COORDINATE.into()));

        let err = computer(json!({"action": "left_click_drag"})).unwrap_err();
        assert_eq!(err.to_string(), "Invalid coordinate for mouse action");

        let err = computer(json!({"action": "mouse_move", "coordinate": [1, 2, 3]})).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAction(INVALID_COORDINATE.into()));

        let err = computer(json!({"action": "mouse_move", "coordinate": ["a", 2]})).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAction(INVALID_COORDINATE.into()));
    }

    #[test]
    fn out_of_frame_coordinates_pass_through() {
        let drag = computer(json!({"action": "left_click_drag", "coordinate": [1500, -40]})).unwrap();
        assert_eq!(drag.action, Action::Drag { x: 1500.0, y: -40.0 });
    }

    #[test]
    fn keyboard_actions_need_text() {
        let err = computer(json!({"action": "type"})).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAction(MISSING_TEXT.into()));

        let typed = computer(json!({"action": "type", "text": "hello"})).unwrap();
        assert_eq!(typed.action, Action::TypeText { text: "hello".into() });

        let key = computer(json!({"action": "key", "text": "ctrl+l"})).unwrap();
        assert_eq!(key.action, Action::KeyPress { key: "ctrl+l".into() });
    }

    #[test]
    fn argument_free_actions_map_directly() {
        let cases = [
            ("left_click", Action::Click { kind: ClickKind::Left }),
            ("right_click", Action::Click { kind: ClickKind::Right }),
            ("middle_click", Action::Click { kind: ClickKind::Middle }),
            ("double_click", Action::Click { kind: ClickKind::Double }),
            ("screenshot", Action::Screenshot),
            ("cursor_position", Action::CursorPosition),
        ];
        for (name, expected) in cases {
            assert_eq!(computer(json!({"action": name})).unwrap().action, expected);
        }
    }

    #[test]
    fn unknown_actions_and_tools_are_rejected() {
        let err = computer(json!({"action": "unsupported_thing"})).unwrap_err();
        assert_eq!(err, ProtocolError::UnsupportedAction("unsupported_thing".into()));
        assert_eq!(err.to_string(), "Unsupported action: unsupported_thing");

        let err = extract_action(&mut response(vec![tool("t", "bash", json!({"command": "ls"}))]))
            .unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedTool("bash".into()));
    }

    #[test]
    fn request_carries_history_and_fixed_manifest() {
        let translator = Translator::new(
            "claude-test".into(),
            1024,
            "be careful".into(),
            load_builtin_tools().unwrap(),
        );
        let conversation = Conversation::new("click at 100,100");
        let first = translator.build_request(&conversation);
        let second = translator.build_request(&conversation);

        assert_eq!(first.system, "be careful");
        assert_eq!(first.system, second.system);
        assert_eq!(first.tools, second.tools);
        assert_eq!(first.tools.len(), 2);
        assert_eq!(first.max_tokens, 1024);
        assert_eq!(first.messages, vec![Message::user_text("click at 100,100")]);
    }

    #[test]
    fn tool_result_references_id_and_embeds_png() {
        let msg = tool_result_message("toolu_7", &[0x89, b'P', b'N', b'G']);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.tool_result_ids(), vec!["toolu_7"]);

        let json = serde_json::to_value(&msg).unwrap();
        let inner = &json["content"][0]["content"];
        assert_eq!(inner[0]["text"], SCREENSHOT_RESULT_TEXT);
        assert_eq!(inner[1]["source"]["data"], "iVBORw==");
    }

    #[test]
    fn projection_covers_text_and_tool_use() {
        let resp = response(vec![
            ResponseBlock::Text { text: "  I will click.  ".into() },
            ResponseBlock::Text { text: "   ".into() },
            tool("t", "computer", json!({"action": "mouse_move", "coordinate": [3, 4]})),
        ]);
        let notes = project(&resp);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].to_string(), "Assistant: I will click.");
        assert_eq!(
            notes[1],
            Notification::ActionPerformed(
                json!({"type": "mouse_move", "x": 3, "y": 4, "text": null})
            )
        );
        assert!(notes[1].to_string().starts_with("Performed action: {"));
    }
}

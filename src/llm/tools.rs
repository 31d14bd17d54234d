use crate::errors::{GruntyError, GruntyResult};
use crate::llm::types::ToolDef;

pub const COMPUTER_TOOL: &str = "computer";
pub const FINISH_TOOL: &str = "finish";

/// Loads the two built-in tool definitions from prompts/tools/builtin.json.
/// The JSON is embedded at compile time via include_str!.
pub fn load_builtin_tools() -> GruntyResult<Vec<ToolDef>> {
    let json = include_str!("../../prompts/tools/builtin.json");
    serde_json::from_str(json)
        .map_err(|e| GruntyError::Config(format!("Failed to parse builtin tools: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_has_exactly_computer_and_finish() {
        let tools = load_builtin_tools().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![COMPUTER_TOOL, FINISH_TOOL]);

        let actions = tools[0].input_schema["properties"]["action"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(actions.len(), 10);
        assert_eq!(tools[1].input_schema["required"], serde_json::json!(["success"]));
    }
}

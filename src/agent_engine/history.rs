use crate::llm::types::{Message, Role};

/// Append-only message history of one run, seeded with the task instructions.
///
/// Lives only in memory and is dropped with its session.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user_text(instructions)],
        }
    }

    pub fn push(&mut self, message: Message) {
        debug_assert!(
            self.messages.last().map(|m| m.role) != Some(message.role),
            "roles must alternate"
        );
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Checks alternation and that each tool result answers the first tool use
    /// of the assistant turn right before it.
    pub fn is_well_paired(&self) -> bool {
        let alternates = self.messages.first().map(|m| m.role) == Some(Role::User)
            && self
                .messages
                .windows(2)
                .all(|pair| pair[0].role != pair[1].role);

        let paired = self.messages.windows(2).all(|pair| {
            let results = pair[1].tool_result_ids();
            if pair[1].role != Role::User || results.is_empty() {
                return true;
            }
            let uses = pair[0].tool_use_ids();
            results.len() == 1 && uses.first() == results.first()
        });

        alternates && paired
    }
}

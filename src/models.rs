use std::fmt;

/// Identifier of a remote message, as returned by the list call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef(pub String);

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// To-do items derived from one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoSummary {
    pub message_ref: MessageRef,
    pub todos: String,
}

impl TodoSummary {
    pub fn new(message_ref: MessageRef, todos: impl Into<String>) -> Self {
        Self {
            message_ref,
            todos: todos.into(),
        }
    }

    /// Text block for this summary, headed by the originating message id
    pub fn render(&self) -> String {
        format!("Email ID {}:\n{}\n", self.message_ref, self.todos)
    }
}

/// Ordered collection of per-message summaries for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedReport {
    summaries: Vec<TodoSummary>,
}

impl AggregatedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, summary: TodoSummary) {
        self.summaries.push(summary);
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn summaries(&self) -> &[TodoSummary] {
        &self.summaries
    }

    /// Join all blocks in processing order, separated by a blank line
    pub fn render(&self) -> String {
        self.summaries
            .iter()
            .map(TodoSummary::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

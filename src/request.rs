use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Failed to parse request: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Request has no tool name")]
    MissingToolName,
}

/// Kind of operation the host proposes to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolKind {
    FileWrite,
    FileEdit,
    MultiFileEdit,
    ShellCommand,
    WebFetch,
    WebSearch,
    Other(String),
}

impl ToolKind {
    /// Map the host's tool name onto an operation kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Write" => ToolKind::FileWrite,
            "Edit" => ToolKind::FileEdit,
            "MultiEdit" => ToolKind::MultiFileEdit,
            "Bash" => ToolKind::ShellCommand,
            "WebFetch" => ToolKind::WebFetch,
            "WebSearch" => ToolKind::WebSearch,
            other => ToolKind::Other(other.to_string()),
        }
    }

    /// True for operations that touch a file on disk.
    pub fn is_file_operation(&self) -> bool {
        matches!(
            self,
            ToolKind::FileWrite | ToolKind::FileEdit | ToolKind::MultiFileEdit
        )
    }
}

/// One old/new replacement within an edit operation.
#[derive(Debug, Clone, Deserialize)]
pub struct EditPair {
    #[serde(default)]
    pub old_string: String,
    #[serde(default)]
    pub new_string: String,
}

/// Raw request payload as produced by the host runtime.
#[derive(Debug, Clone, Deserialize)]
struct RawRequest {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: Value,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    cwd: Option<PathBuf>,
}

/// One proposed operation, consumed once per invocation.
///
/// Validators never mutate the request; field accessors pull the
/// tool-specific parameters out of the `tool_input` mapping.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub tool_name: String,
    pub tool_kind: ToolKind,
    pub tool_input: Value,
    pub session_id: Option<String>,
    pub cwd: PathBuf,
}

impl OperationRequest {
    /// Parse a request from the host's JSON payload.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let raw: RawRequest = serde_json::from_str(json)?;
        if raw.tool_name.is_empty() {
            return Err(RequestError::MissingToolName);
        }

        let cwd = raw
            .cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            tool_kind: ToolKind::from_name(&raw.tool_name),
            tool_name: raw.tool_name,
            tool_input: raw.tool_input,
            session_id: raw.session_id,
            cwd,
        })
    }

    /// Build a request directly (used by the library API and tests).
    pub fn new(tool_name: &str, tool_input: Value, cwd: PathBuf) -> Self {
        Self {
            tool_kind: ToolKind::from_name(tool_name),
            tool_name: tool_name.to_string(),
            tool_input,
            session_id: None,
            cwd,
        }
    }

    fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.get(key).and_then(Value::as_str)
    }

    /// Target file path, when the operation has one.
    pub fn file_path(&self) -> Option<&str> {
        self.input_str("file_path")
    }

    /// Literal content for whole-file writes.
    pub fn content(&self) -> Option<&str> {
        self.input_str("content")
    }

    /// Shell command text.
    pub fn command(&self) -> Option<&str> {
        self.input_str("command")
    }

    /// Target URL for web fetches.
    pub fn url(&self) -> Option<&str> {
        self.input_str("url")
    }

    /// Search query for web searches.
    pub fn query(&self) -> Option<&str> {
        self.input_str("query")
    }

    /// Replacement pairs for edit operations.
    ///
    /// Single edits carry `old_string`/`new_string` at the top level;
    /// multi-edits carry an `edits` array of pairs.
    pub fn edits(&self) -> Vec<EditPair> {
        if let Some(list) = self.tool_input.get("edits").and_then(Value::as_array) {
            return list
                .iter()
                .filter_map(|e| serde_json::from_value(e.clone()).ok())
                .collect();
        }

        if self.tool_input.get("old_string").is_some() || self.tool_input.get("new_string").is_some()
        {
            return vec![EditPair {
                old_string: self.input_str("old_string").unwrap_or_default().to_string(),
                new_string: self.input_str("new_string").unwrap_or_default().to_string(),
            }];
        }

        Vec::new()
    }

    /// All literal text this operation would introduce, for content scans.
    pub fn written_text(&self) -> Vec<&str> {
        match self.tool_kind {
            ToolKind::FileWrite => self.content().into_iter().collect(),
            ToolKind::FileEdit | ToolKind::MultiFileEdit => {
                // Borrowing through edits() would copy; read the raw values.
                let mut out = Vec::new();
                if let Some(s) = self.input_str("new_string") {
                    out.push(s);
                }
                if let Some(list) = self.tool_input.get("edits").and_then(Value::as_array) {
                    for e in list {
                        if let Some(s) = e.get("new_string").and_then(Value::as_str) {
                            out.push(s);
                        }
                    }
                }
                out
            }
            _ => Vec::new(),
        }
    }
}

//! Tool definitions, argument decoding and the tool registry.

use crate::error::{Result, SporError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// JSON type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamKind {
    fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// One accepted argument of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// Name, description and argument schema offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, parameters: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// JSON Schema object describing the arguments.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.kind.as_str(),
                        "description": p.description,
                    }),
                )
            })
            .collect();

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Decode and check the model's argument payload against this spec.
    pub fn parse_arguments(&self, raw: &str) -> Result<ToolArguments> {
        let parse_error = |reason: String| SporError::ToolInvocationParse {
            tool: self.name.clone(),
            reason,
        };

        // Some providers send an empty string for argument-less calls.
        let value: Value = if raw.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| parse_error(format!("invalid JSON: {}", e)))?
        };

        let Value::Object(map) = value else {
            return Err(parse_error("arguments must be a JSON object".to_string()));
        };

        for param in &self.parameters {
            match map.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(parse_error(format!("missing '{}' argument", param.name)));
                }
                Some(value) if !value.is_null() && !param.kind.accepts(value) => {
                    return Err(parse_error(format!(
                        "'{}' must be a {}",
                        param.name,
                        param.kind.as_str()
                    )));
                }
                _ => {}
            }
        }

        Ok(ToolArguments(map))
    }
}

/// Decoded tool arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// String argument declared as required by the tool.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.get_str(name)
            .ok_or_else(|| SporError::InvalidInput(format!("Missing '{}' argument", name)))
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Payload a tool hands back to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Hits(Vec<SearchHit>),
    Text(String),
}

impl ToolResult {
    /// Serialize for the tool-result message.
    pub fn to_content(&self) -> Result<String> {
        match self {
            ToolResult::Hits(hits) => Ok(serde_json::to_string(hits)?),
            ToolResult::Text(text) => Ok(text.clone()),
        }
    }

    /// True when the tool produced nothing usable.
    pub fn is_empty(&self) -> bool {
        match self {
            ToolResult::Hits(hits) => hits.is_empty(),
            ToolResult::Text(text) => text.trim().is_empty(),
        }
    }
}

/// A function the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition offered to the model.
    fn spec(&self) -> &ToolSpec;

    /// Run the tool.
    async fn invoke(&self, args: &ToolArguments) -> Result<ToolResult>;

    /// Result substituted when `invoke` fails or finds nothing.
    fn fallback(&self, args: &ToolArguments) -> ToolResult;
}

/// Tools available to the agent, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.spec().name.clone();
        if self.get(&name).is_some() {
            return Err(SporError::Config(format!(
                "Tool '{}' is already registered",
                name
            )));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.spec().name == name)
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec().clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.spec().name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

//! Tool registry
//!
//! Built once at startup from the tool definitions and never mutated. Each
//! entry pairs a definition with its compiled input schema and handler.
//! [`ToolRegistry::dispatch`] is the failure boundary: every error becomes
//! an error-flagged [`ToolResult`].

use std::collections::HashMap;

use jsonschema::Validator;
use serde_json::{Map, Value};

use crate::handlers::{Handler, ToolContext, handler_for};
use crate::tools::{ToolDefinition, ToolResult, get_tool_definitions};
use crate::{Error, Result};

struct RegisteredTool {
    definition: ToolDefinition,
    validator: Validator,
    handler: Handler,
}

impl RegisteredTool {
    /// Check `arguments` against the input schema
    fn validate(&self, arguments: &Value) -> Result<()> {
        let problems: Vec<String> = self
            .validator
            .iter_errors(arguments)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                }
            })
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_parameters(problems.join("; ")))
        }
    }
}

/// Immutable name to tool mapping
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Register every defined tool, compiling its input schema
    pub fn new() -> Result<Self> {
        let mut tools = Vec::new();
        let mut index = HashMap::new();

        for definition in get_tool_definitions() {
            let handler = handler_for(&definition.name)
                .ok_or_else(|| Error::UnknownTool(definition.name.clone()))?;
            let validator =
                jsonschema::validator_for(&definition.input_schema).map_err(|e| Error::Schema {
                    tool: definition.name.clone(),
                    message: e.to_string(),
                })?;
            index.insert(definition.name.clone(), tools.len());
            tools.push(RegisteredTool {
                definition,
                validator,
                handler,
            });
        }

        tracing::debug!(count = tools.len(), "Registered tools");
        Ok(Self { tools, index })
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|t| &t.definition)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Validate and run a tool, returning its JSON payload
    pub async fn call(&self, ctx: &ToolContext, name: &str, arguments: Value) -> Result<Value> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        tool.validate(&arguments)?;

        (tool.handler)(ctx.clone(), arguments).await
    }

    /// Run a tool and wrap the outcome in a tool envelope
    pub async fn dispatch(&self, ctx: &ToolContext, name: &str, arguments: Value) -> ToolResult {
        tracing::debug!(tool = name, "Dispatching tool call");

        let payload = self
            .call(ctx, name, arguments)
            .await
            .and_then(|value| Ok(serde_json::to_string_pretty(&value)?));

        match payload {
            Ok(text) => ToolResult::text(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolResult::error(e.to_string())
            }
        }
    }
}

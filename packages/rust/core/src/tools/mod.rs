//! Tools exposed to agents: name, description, JSON arguments in, text out.

mod csv_writer;
mod markdown_table;
mod scrape_website;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use reviewcrew_shared::{Result, ReviewCrewError};

pub use csv_writer::CsvWriterTool;
pub use markdown_table::MarkdownTableTool;
pub use scrape_website::ScrapeWebsiteTool;

/// A capability an agent can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the agent uses to call this tool.
    fn name(&self) -> &str;

    /// Natural-language description sent to the language model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Run the tool. The reply is plain text for the agent.
    async fn call(&self, args: Value) -> Result<String>;
}

/// Serializable description of a tool, as registered with an agent framework.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Name-indexed set of tools.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.insert(Arc::new(tool));
        self
    }

    pub fn insert(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// A new set holding only the named tools that exist in this one.
    pub fn subset(&self, names: &[String]) -> Self {
        let tools = names
            .iter()
            .filter_map(|n| self.tools.get(n).map(|t| (n.clone(), t.clone())))
            .collect();
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Dispatch a call by tool name.
    #[instrument(skip(self, args))]
    pub async fn call(&self, name: &str, args: Value) -> Result<String> {
        let tool = self.get(name).ok_or_else(|| {
            ReviewCrewError::validation(format!(
                "unknown tool '{name}' (available: {})",
                self.names().join(", ")
            ))
        })?;
        debug!("dispatching tool call");
        tool.call(args).await
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.names()).finish()
    }
}

/// Deserialize tool arguments, reporting bad shapes as validation errors.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| ReviewCrewError::validation(format!("{tool}: invalid arguments: {e}")))
}

/// Formatting tools accept either `{"data": [...], ...}` or the bare table.
pub(crate) fn wrap_bare_data(args: Value) -> Value {
    match args {
        Value::Array(_) | Value::String(_) => serde_json::json!({ "data": args }),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the input back."
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn call(&self, args: Value) -> Result<String> {
            Ok(args.to_string())
        }
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let tools = ToolSet::new().with(EchoTool);
        let reply = tools.call("echo", json!({"x": 1})).await.unwrap();
        assert_eq!(reply, r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_validation_error() {
        let tools = ToolSet::new().with(EchoTool);
        let err = tools.call("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ReviewCrewError::Validation { .. }));
        assert!(err.to_string().contains("available: echo"));
    }

    #[test]
    fn subset_skips_missing_names() {
        let tools = ToolSet::new().with(EchoTool);
        let sub = tools.subset(&["echo".into(), "SerperDevTool".into()]);
        assert_eq!(sub.names(), vec!["echo"]);
    }

    #[test]
    fn bare_data_is_wrapped() {
        assert_eq!(wrap_bare_data(json!([1])), json!({"data": [1]}));
        assert_eq!(wrap_bare_data(json!({"data": []})), json!({"data": []}));
    }
}

use crate::config::ScriptsConfig;
use crate::error::ToolError;
use crate::tools::catalog_tools;
use crate::traits::{Tool, ToolDefinition, ToolResult};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Read-only tool catalog. Definitions are computed once and sent verbatim
/// with every model request.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let definitions = tools.iter().map(|t| t.definition()).collect();
        Self { tools, definitions }
    }

    pub fn from_catalog(scripts: &ScriptsConfig) -> Self {
        Self::new(catalog_tools(scripts))
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn Tool>, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub async fn execute(&self, name: &str, args: &Map<String, Value>) -> ToolResult {
        let result = match self.get(name) {
            Ok(tool) => tool.execute(args).await,
            Err(e) => {
                tracing::warn!(tool = name, "Model requested a tool outside the catalog");
                Err(e)
            }
        };
        ToolResult::from(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticTool;
    use serde_json::json;

    #[test]
    fn catalog_registry_exposes_every_tool() {
        let registry = ToolRegistry::from_catalog(&ScriptsConfig::default());
        assert_eq!(registry.len(), 11);
        assert!(registry.definitions().iter().any(|d| d.name == "get_projects"));
        assert!(registry.get("complete_task").is_ok());
    }

    #[tokio::test]
    async fn unknown_tool_becomes_an_error_result() {
        let registry = ToolRegistry::new(vec![StaticTool::ok("get_projects", json!([]))]);

        assert!(matches!(
            registry.get("drop_database"),
            Err(ToolError::UnknownTool(_))
        ));

        let result = registry.execute("drop_database", &Map::new()).await;
        assert!(!result.ok);
        assert_eq!(result.to_content(), r#"{"error":"Unknown tool: drop_database"}"#);
    }

    #[tokio::test]
    async fn known_tool_dispatches() {
        let registry = ToolRegistry::new(vec![StaticTool::ok(
            "get_projects",
            json!({"projects": ["tower"]}),
        )]);
        let result = registry.execute("get_projects", &Map::new()).await;
        assert!(result.ok);
        assert_eq!(result.payload, Some(json!({"projects": ["tower"]})));
    }
}

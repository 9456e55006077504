//! Name-keyed tool registry

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use super::{ActionError, ToolHandler};

/// A registered tool: its schema and, once bound, its handler
#[derive(Clone)]
struct RegisteredTool {
    schema: Value,
    handler: Option<Arc<dyn ToolHandler>>,
}

/// Flat mapping from tool ids to handlers
///
/// Registration is last-write-wins. Handlers are cloned out of the map on
/// resolution so no lock is held while a tool runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, RegisteredTool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to a tool id, keeping any schema already recorded
    pub fn register(&self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        let name = name.into();
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = match tools.get_mut(&name) {
            Some(tool) => tool.handler.replace(handler).is_some(),
            None => {
                tools.insert(
                    name.clone(),
                    RegisteredTool {
                        schema: Value::Null,
                        handler: Some(handler),
                    },
                );
                false
            }
        };
        tracing::info!(tool = %name, replaced, "registered tool");
    }

    /// Register a tool with both its schema and handler
    pub fn register_with_schema(
        &self,
        name: impl Into<String>,
        schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) {
        let name = name.into();
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.clone(),
                RegisteredTool {
                    schema,
                    handler: Some(handler),
                },
            );
        tracing::info!(tool = %name, "registered tool");
    }

    /// Record a tool's schema without binding a handler
    ///
    /// An existing handler stays bound. Resolving a schema-only tool yields
    /// [`ActionError::NotFound`].
    pub fn register_schema(&self, name: impl Into<String>, schema: Value) {
        let name = name.into();
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        match tools.get_mut(&name) {
            Some(tool) => tool.schema = schema,
            None => {
                tools.insert(
                    name.clone(),
                    RegisteredTool {
                        schema,
                        handler: None,
                    },
                );
            }
        }
        tracing::info!(tool = %name, "registered tool schema");
    }

    /// Look up the handler for a tool id
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::NotFound`] if no handler is bound to `name`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>, ActionError> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|tool| tool.handler.clone())
            .ok_or_else(|| ActionError::NotFound {
                tool: name.to_string(),
            })
    }

    /// Registered tool ids, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Schema recorded for a tool (`Null` if registered without one)
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<Value> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|tool| tool.schema.clone())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::intent::Parameters;
    use crate::tools::handler_fn;

    fn constant(message: &'static str) -> Arc<dyn ToolHandler> {
        handler_fn(move |_params: Parameters| async move {
            let mut out = Parameters::new();
            out.insert("message".to_string(), message.into());
            Ok(out)
        })
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let registry = ToolRegistry::new();
        registry.register("light_control", constant("first"));
        registry.register("light_control", constant("second"));

        assert_eq!(registry.len(), 1);
        let handler = registry.resolve("light_control").unwrap();
        let out = handler.invoke(&Parameters::new()).await.unwrap();
        assert_eq!(out["message"], "second");
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("nope").err().unwrap();
        assert_eq!(
            err,
            ActionError::NotFound {
                tool: "nope".to_string()
            }
        );
    }

    #[test]
    fn schema_only_tool_is_listed_but_not_resolvable() {
        let registry = ToolRegistry::new();
        registry.register_schema("calendar.add", json!({"type": "object"}));

        assert_eq!(registry.names(), vec!["calendar.add"]);
        assert_eq!(registry.schema("calendar.add"), Some(json!({"type": "object"})));
        assert!(matches!(
            registry.resolve("calendar.add"),
            Err(ActionError::NotFound { .. })
        ));
    }

    #[test]
    fn schema_update_keeps_handler() {
        let registry = ToolRegistry::new();
        registry.register("get_time", constant("12:00"));
        registry.register_schema("get_time", json!({"type": "object"}));

        assert!(registry.resolve("get_time").is_ok());
        assert_eq!(registry.schema("get_time"), Some(json!({"type": "object"})));
    }

    #[test]
    fn names_are_sorted() {
        let registry = ToolRegistry::new();
        registry.register("b", constant("b"));
        registry.register("a", constant("a"));
        registry.register_schema("c", Value::Null);
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        assert!(registry.contains("c"));
        assert!(!registry.is_empty());
    }
}

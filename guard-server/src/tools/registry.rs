use serde::Serialize;
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// Whether a tool may run without explicit human confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Normal,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub required_scope: String,
    pub risk: RiskTier,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        required_scope: impl Into<String>,
        risk: RiskTier,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required_scope: required_scope.into(),
            risk,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.risk == RiskTier::Destructive
    }
}

/// Immutable catalog of invocable tools, kept in declaration order
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        Self { tools }
    }

    /// The catalog served by default
    pub fn builtin() -> Self {
        Self::new(vec![
            ToolDefinition::new(
                "read_files",
                "Read files from the project.",
                "files:read",
                RiskTier::Normal,
            ),
            ToolDefinition::new(
                "delete_files",
                "Delete files. DANGEROUS.",
                "files:delete",
                RiskTier::Destructive,
            ),
            ToolDefinition::new(
                "send_email",
                "Send an email to someone external.",
                "email:write",
                RiskTier::Normal,
            ),
        ])
    }

    pub fn by_name(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Tools whose required scope is among `scopes`
    pub fn list_for<'a>(
        &'a self,
        scopes: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a ToolDefinition> + 'a {
        self.tools
            .iter()
            .filter(move |tool| scopes.contains(&tool.required_scope))
    }

    /// Distinct required scopes, in catalog order
    pub fn scopes_supported(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            if !scopes.contains(&tool.required_scope) {
                scopes.push(tool.required_scope.clone());
            }
        }
        scopes
    }
}

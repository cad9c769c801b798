//! Tool descriptors and the per-request tool catalog.

use serde::{Deserialize, Serialize};

/// Definition of a tool the model may request during a diagnosis run.
///
/// Produced by the catalog resolver from the tool service's listing and
/// read-only afterwards.
///
/// # Examples
///
/// ```ignore
/// use buildprint_runner::domain::diagnosis::ToolDescriptor;
///
/// let descriptor = ToolDescriptor::new(
///     "get_tree",
///     "Return the component tree of a page",
///     serde_json::json!({
///         "type": "object",
///         "required": ["page"],
///         "properties": { "page": { "type": "string" } }
///     }),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name of the tool within the catalog (e.g., "get_tree")
    name: String,

    /// Human-readable description shown to the model
    description: String,

    /// JSON Schema for the arguments
    input_schema: serde_json::Value,
}

impl ToolDescriptor {
    /// Creates a new tool descriptor.
    ///
    /// A schema that is not a JSON object is replaced with an empty object
    /// schema; the model service rejects anything else.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        let input_schema = if input_schema.is_object() {
            input_schema
        } else {
            serde_json::json!({"type": "object", "properties": {}})
        };

        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    pub fn input_schema(&self) -> &serde_json::Value {
        &self.input_schema
    }

    /// Converts to Anthropic tool format.
    pub fn to_anthropic_format(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema
        })
    }
}

/// Result of resolving the tool catalog for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCatalog {
    /// The tool service answered with at least one tool.
    Available(Vec<ToolDescriptor>),
    /// The tool service could not be used; the run proceeds without tools.
    Unavailable { reason: String },
}

impl ToolCatalog {
    /// Builds an available catalog, keeping the first descriptor for each name.
    ///
    /// An empty listing is reported as unavailable so the model is never
    /// offered an empty tool set.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut tools: Vec<ToolDescriptor> = Vec::new();
        for descriptor in descriptors {
            if descriptor.name().is_empty() {
                continue;
            }
            if tools.iter().any(|t| t.name() == descriptor.name()) {
                continue;
            }
            tools.push(descriptor);
        }

        if tools.is_empty() {
            return Self::unavailable("tool service advertised no tools");
        }
        Self::Available(tools)
    }

    /// Creates an unavailable catalog.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the tools (empty when unavailable).
    pub fn tools(&self) -> &[ToolDescriptor] {
        match self {
            Self::Available(tools) => tools,
            Self::Unavailable { .. } => &[],
        }
    }

    /// Returns the reason the catalog is unavailable.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name() == name)
    }
}

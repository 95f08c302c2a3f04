//! Lexical detection of artifact and manifest references in node
//! properties.

use regex::Regex;
use serde_json::Value;

use phasegrid_model::{Node, StepType};

/// Compiled patterns for one resolver.
#[derive(Debug, Clone)]
pub struct ExpressionScanner {
    artifact: Regex,
    manifest: Regex,
    expression: Regex,
}

impl ExpressionScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            artifact: Regex::new(r"\$\{(?:artifact\.|ARTIFACT_FILE_NAME\})")?,
            manifest: Regex::new(r"\$\{helmChart\.")?,
            expression: Regex::new(r"\$\{[^{}]+\}")?,
        })
    }

    pub fn mentions_artifact<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> bool {
        values.into_iter().any(|v| self.artifact.is_match(v))
    }

    pub fn mentions_manifest<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> bool {
        values.into_iter().any(|v| self.manifest.is_match(v))
    }

    /// True when the value still holds an unresolved `${...}` parameter.
    pub fn is_live_expression(&self, value: &str) -> bool {
        self.expression.is_match(value)
    }
}

/// Values bound into a linked template. Empty for unlinked nodes.
pub fn template_variable_values(node: &Node) -> Vec<&str> {
    if !node.is_linked() {
        return Vec::new();
    }
    node.template_variables
        .iter()
        .filter_map(|v| v.value.as_deref())
        .filter(|v| !v.is_empty())
        .collect()
}

/// String properties a user may put expressions into, for the kinds that
/// are scanned lexically.
pub fn templatizable_values(node: &Node) -> Vec<&str> {
    match &node.step_type {
        StepType::Http => ["url", "body", "assertion"]
            .into_iter()
            .filter_map(|key| node.str_property(key))
            .collect(),
        StepType::ShellScript => node.str_property("scriptString").into_iter().collect(),
        StepType::CloudFormationCreateStack => match node.property("variables") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_object)
                .flat_map(|entry| entry.values())
                .filter_map(Value::as_str)
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

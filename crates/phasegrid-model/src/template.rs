//! Template expressions and user variables.
//!
//! A field is templatized when its value is deferred to a named runtime
//! parameter written as `${Name}`.

use serde::{Deserialize, Serialize};

use crate::kinds::EntityType;

/// Field names that carry entity bindings.
pub mod fields {
    pub const SERVICE_ID: &str = "serviceId";
    pub const ENV_ID: &str = "envId";
    pub const INFRA_DEFINITION_ID: &str = "infraDefinitionId";
    pub const INFRA_MAPPING_ID: &str = "infraMappingId";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
}

/// Binding of a field to a `${Name}` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExpression {
    pub field_name: String,
    pub expression: String,
    #[serde(default)]
    pub metadata: TemplateMetadata,
    #[serde(default = "default_true")]
    pub mandatory: bool,
}

fn default_true() -> bool {
    true
}

impl TemplateExpression {
    pub fn new(field_name: &str, expression: &str, entity_type: EntityType) -> Self {
        Self {
            field_name: field_name.to_string(),
            expression: expression.to_string(),
            metadata: TemplateMetadata {
                entity_type: Some(entity_type),
                artifact_type: None,
            },
            mandatory: true,
        }
    }

    /// Parameter name inside `${...}`, if the expression is well formed.
    pub fn parameter_name(&self) -> Option<&str> {
        parameter_name(&self.expression)
    }
}

/// A workflow input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub mandatory: bool,
}

impl Variable {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            entity_type: None,
            value: value.map(str::to_string),
            artifact_type: None,
            mandatory: false,
        }
    }
}

/// Service variable override on a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameValuePair {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Returns the parameter name of a `${Name}` expression.
pub fn parameter_name(expression: &str) -> Option<&str> {
    let inner = expression.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        return None;
    }
    Some(inner)
}

/// True when the whole value is a single `${...}` expression.
pub fn is_expression(value: &str) -> bool {
    parameter_name(value).is_some()
}

/// Finds the expression bound to `field_name`.
pub fn find_expression<'a>(
    expressions: &'a [TemplateExpression],
    field_name: &str,
) -> Option<&'a TemplateExpression> {
    expressions.iter().find(|e| e.field_name == field_name)
}

pub fn is_templatized(expressions: &[TemplateExpression], field_name: &str) -> bool {
    find_expression(expressions, field_name).is_some()
}

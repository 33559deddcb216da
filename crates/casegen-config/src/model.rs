use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical constraint configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintConfig {
    /// Contract version for the configuration format.
    pub config_version: String,
    /// Seed for reproducible generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Additional character sets by id (built-in sets are always available).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub charsets: BTreeMap<String, String>,
    /// Top-level constraints; each one becomes a generation root.
    pub constraints: Vec<ConstraintSpec>,
}

/// Declarative description of one constraint node.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintSpec {
    /// Explicit identifier, unique across the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Character set id, inherited by nested nodes that declare none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

/// Constraint node variants.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Fixed string value.
    Constant { value: String },
    /// Leaf value generator.
    Field { field: FieldSpec },
    /// Concatenation of parts.
    Combined {
        parts: Vec<ChildSpec>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        separator: String,
    },
    /// Child generated only when mandatory or chosen.
    Optional {
        child: ChildSpec,
        #[serde(default)]
        mandatory: MandatorySpec,
    },
    /// Pure forwarding to a child.
    Source { child: ChildSpec },
}

/// Child of a composite node: a reference by id or an embedded node.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ChildSpec {
    Reference(ReferenceSpec),
    Embedded(Box<ConstraintSpec>),
}

/// Reference to a constraint declared elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReferenceSpec {
    #[serde(rename = "ref")]
    pub id: String,
}

/// Mandatory predicate of an optional constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MandatorySpec {
    Fixed(bool),
    /// Mandatory while the named constraint yields a non-blank value.
    WhenPresent { when_present: String },
}

impl Default for MandatorySpec {
    fn default() -> Self {
        MandatorySpec::Fixed(false)
    }
}

/// Leaf field kinds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Text drawn from the node's character set.
    Text { min_len: usize, max_len: usize },
    /// Integer range, inclusive.
    Number { min: i64, max: i64 },
    /// Calendar date range, inclusive (`YYYY-MM-DD`).
    Date {
        min: String,
        max: String,
        /// chrono format string for the output (default `%Y-%m-%d`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// One of a fixed list of values.
    Choice { values: Vec<String> },
    /// Strings matching a regular expression.
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_repeat: Option<u32>,
    },
}

impl ChildSpec {
    pub fn reference(id: impl Into<String>) -> Self {
        ChildSpec::Reference(ReferenceSpec { id: id.into() })
    }

    pub fn embedded(spec: ConstraintSpec) -> Self {
        ChildSpec::Embedded(Box::new(spec))
    }
}

impl ConstraintSpec {
    pub fn new(id: Option<&str>, kind: ConstraintKind) -> Self {
        Self {
            id: id.map(|value| value.to_string()),
            charset: None,
            kind,
        }
    }

    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }

    /// Children in declaration order.
    pub fn children(&self) -> Vec<&ChildSpec> {
        match &self.kind {
            ConstraintKind::Constant { .. } | ConstraintKind::Field { .. } => Vec::new(),
            ConstraintKind::Combined { parts, .. } => parts.iter().collect(),
            ConstraintKind::Optional { child, .. } | ConstraintKind::Source { child } => {
                vec![child]
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ConstraintKind::Constant { .. } => "constant",
            ConstraintKind::Field { .. } => "field",
            ConstraintKind::Combined { .. } => "combined",
            ConstraintKind::Optional { .. } => "optional",
            ConstraintKind::Source { .. } => "source",
        }
    }
}

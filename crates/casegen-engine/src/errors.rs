use thiserror::Error;

use casegen_config::ConfigError;
use casegen_core::CoreError;

use crate::model::GenerationReport;

/// Errors emitted by the constraint engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("constraint id '{0}' not found")]
    IdNotFound(String),
    #[error("constraint id '{0}' is declared more than once")]
    DuplicateId(String),
    #[error(
        "constraint '{node}' was re-entered before its generation finished (cyclic or duplicate reference)"
    )]
    Reentrant { node: String },
    #[error("constraint '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: Box<GenerationError>,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("generation failed")]
    Failed(Box<GenerationReport>),
}

impl GenerationError {
    /// Wrap a failure with the identity of the node it surfaced through.
    pub fn in_node(node: impl Into<String>, source: GenerationError) -> Self {
        GenerationError::Node {
            node: node.into(),
            source: Box::new(source),
        }
    }

    /// Innermost error below any node wrappers.
    pub fn root_cause(&self) -> &GenerationError {
        let mut current = self;
        while let GenerationError::Node { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn is_reentrant(&self) -> bool {
        matches!(self.root_cause(), GenerationError::Reentrant { .. })
    }

    /// Node identities from the outermost wrapper down to the failing node.
    pub fn node_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        loop {
            match current {
                GenerationError::Node { node, source } => {
                    path.push(node.as_str());
                    current = source;
                }
                GenerationError::Reentrant { node } => {
                    path.push(node.as_str());
                    break;
                }
                _ => break,
            }
        }
        path
    }
}

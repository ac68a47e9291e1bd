/// Failures at the document boundary (load, save, validation).
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported document version: {0}")]
    UnsupportedVersion(String),

    #[error("duplicate id in document: {0}")]
    DuplicateId(String),

    #[error("connector {connector} references missing node {node}")]
    DanglingConnector { connector: String, node: String },

    #[error("connector {0} starts and ends at the same node")]
    SelfLoop(String),

    #[error("connector {connector} duplicates an existing connection")]
    DuplicateConnector { connector: String },

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid canvas settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

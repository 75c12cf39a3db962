use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompassError {
    #[error("not initialized: run 'compass init'")]
    NotInitialized,

    #[error("directive not found: {0}")]
    DirectiveNotFound(String),

    #[error("directive already exists: {0}")]
    DirectiveExists(String),

    #[error("invalid directive name '{0}': must be lowercase alphanumeric with hyphens or underscores")]
    InvalidDirectiveName(String),

    #[error("reference directive '{0}' cannot carry a hierarchy level")]
    ReferenceWithLevel(String),

    #[error("directive '{directive}' names unknown parent '{parent}'")]
    UnknownParent { directive: String, parent: String },

    #[error("no active directive: pass one explicitly or set it first")]
    NoActiveDirective,

    #[error("wildcard source not allowed for flow type '{flow_type}'")]
    WildcardNotAllowed { flow_type: String },

    #[error("edge source references unknown directive: {0}")]
    UnknownEdgeSource(String),

    #[error("edge target references unknown directive: {0}")]
    UnknownEdgeTarget(String),

    #[error("invalid flow type: {0}")]
    InvalidFlowType(String),

    #[error("invalid directive category: {0}")]
    InvalidCategory(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool already registered: {0}")]
    ToolExists(String),

    #[error("cannot load '{symbol}' from '{module}': {reason}")]
    ImportFailure {
        module: String,
        symbol: String,
        reason: String,
    },

    #[error("tool '{tool}' failed: {reason}")]
    Invocation { tool: String, reason: String },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompassError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RucheckError {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("malformed directive: {0}")]
    MalformedDirective(String),

    #[error("no value found for variable with xpath expression {0}")]
    SelectorMiss(String),

    #[error("invalid xpath expression {selector}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid xml: {0}")]
    XmlParse(String),

    #[error("invalid expectation: {0}")]
    InvalidExpectation(String),

    #[error("substitution did not settle after {passes} passes")]
    RewriteLimit { passes: usize },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

// Add conversion from anyhow::Error
impl From<anyhow::Error> for RucheckError {
    fn from(err: anyhow::Error) -> Self {
        RucheckError::Other(err.to_string())
    }
}

/// Result type for rucheck crate
pub type Result<T> = std::result::Result<T, RucheckError>;

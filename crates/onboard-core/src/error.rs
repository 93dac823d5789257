use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnboardError {
    #[error("failed to find matches for path {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to read file {path:?}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read YAML from file {path:?}: {source}")]
    ParseFile {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration contains validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("template for {0:?} was not compiled; validate the configuration first")]
    TemplateNotCompiled(String),

    #[error("failed to execute template: {0}")]
    TemplateRender(String),

    #[error("failed to open file {path:?}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {message}")]
    CommandSpawn { program: String, message: String },

    #[error("{program} {args} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        status: String,
        stderr: String,
    },

    #[error("failed to execute action {name:?}: {source}")]
    Step {
        name: String,
        #[source]
        source: Box<OnboardError>,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl OnboardError {
    /// Name of the action that failed, for step failures.
    pub fn failed_action(&self) -> Option<&str> {
        match self {
            OnboardError::Step { name, .. } => Some(name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OnboardError>;

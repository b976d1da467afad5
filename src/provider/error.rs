use thiserror::Error;

/// Errors while generating the content of a provisioned file. None of them aborts the render,
/// the affected file is left empty.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid user options: `{0}`")]
    InvalidOptions(#[source] serde_yaml::Error),

    #[error("converting to json: `{0}`")]
    Json(#[from] serde_json::Error),
}

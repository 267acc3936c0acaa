use eventroute_domain::error::RoutingError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("routing: {0}")]
    Routing(#[from] RoutingError),

    #[error("config: {0}")]
    Config(String),

    #[error("telemetry: {0}")]
    Telemetry(String),

    #[error("http: {0}")]
    Http(String),

    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("route already registered: {0}")]
    RouteAlreadyRegistered(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

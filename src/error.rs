use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("movie {0} not found")]
    MovieNotFound(i32),

    #[error("movie lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),

    #[error("movie data has no {0}")]
    MissingExternalField(&'static str),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MovieNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Lookup(_) | AppError::MissingExternalField(_) => StatusCode::BAD_GATEWAY,
            AppError::Db(_) | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Html(crate::templates::error_page(self.to_string()))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

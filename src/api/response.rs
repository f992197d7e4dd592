use std::error::Error;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::api::models::ErrorBody;
use crate::error::{AppError, MISSING_INPUT_MESSAGE};

/// File name the browser offers when saving the rendered document.
pub const ATTACHMENT_FILENAME: &str = "result.pdf";

const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// The rendered document as a downloadable attachment.
pub fn attachment(document: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ATTACHMENT_FILENAME),
            ),
        ],
        document,
    )
        .into_response()
}

pub fn error(err: &AppError, expose_details: bool) -> Response {
    let status = err.status_code();
    if let AppError::ValidationError = err {
        return (status, MISSING_INPUT_MESSAGE).into_response();
    }

    let (error, stack) = if expose_details {
        (Some(err.to_string()), Some(stack(err)))
    } else {
        (None, None)
    };

    let body = ErrorBody {
        message: GENERIC_FAILURE_MESSAGE.to_string(),
        error,
        stack,
    };

    (status, Json(body)).into_response()
}

/// The error and its chain of sources, outermost first.
fn stack(err: &(dyn Error + 'static)) -> String {
    let mut lines = vec![format!("{:?}", err)];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

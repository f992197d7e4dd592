use axum::{
    async_trait,
    body::{Body, to_bytes},
    extract::{Form, FromRequest, Json, Request},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ConversionRequest {
    /// The trimmed URL, when one was supplied and is not blank.
    pub fn url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Everything one successful request produced.
#[derive(Debug)]
pub struct ConversionResult {
    pub original_text: String,
    pub summary: String,
    pub document: Vec<u8>,
}

/// Body of a 500 response. `error` and `stack` are only filled in when
/// error details are exposed.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

// Same ceiling as axum's default body limit
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Accepts a [`ConversionRequest`] either as JSON or as a urlencoded form.
/// A request without a content type or without a body carries no input, so
/// it yields an empty request and fails validation like one.
pub struct ConversionPayload(pub ConversionRequest);

#[async_trait]
impl<S> FromRequest<S> for ConversionPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|content_type| {
                content_type
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase()
            })
            .filter(|mime| !mime.is_empty());

        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|e| (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response())?;

        let Some(mime) = content_type else {
            return Ok(Self(ConversionRequest::default()));
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(ConversionRequest::default()));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        if mime == "application/json" || mime.ends_with("+json") {
            let Json(request) = Json::<ConversionRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        } else {
            let Form(request) = Form::<ConversionRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        }
    }
}

//! Response bodies shared by the endpoints.

use rocket::http::{RawStr, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error body for JSON endpoints.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = status::Custom<Json<ErrorResponse>>;

pub fn api_error(code: Status, message: impl Into<String>) -> ApiError {
    status::Custom(code, Json(ErrorResponse { error: message.into() }))
}

/// Logs a persistence failure and hides its details from the caller.
pub fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    error!("{}: {}", context, e);
    api_error(Status::InternalServerError, context)
}

/// Outcome of a dashboard action: a message to show and the page the
/// browser should go to next.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum RedirectResponse {
    Success {
        message: String,
        #[serde(rename = "redirectURL")]
        redirect_url: String,
    },
    Failure {
        error: String,
        #[serde(rename = "redirectURL")]
        redirect_url: String,
    },
}

/// Which page a [`RedirectResponse`] sends the browser back to.
#[derive(Debug, Clone, Copy)]
pub enum Page {
    Dashboard,
    Admin,
}

impl Page {
    fn path(self) -> &'static str {
        match self {
            Page::Dashboard => "/dashboard",
            Page::Admin => "/admin",
        }
    }

    /// `<page>?message=<text>`, percent-encoded.
    pub fn message_url(self, text: &str) -> String {
        format!("{}?message={}", self.path(), RawStr::new(text).percent_encode())
    }

    /// `<page>?error=<text>`, percent-encoded.
    pub fn error_url(self, text: &str) -> String {
        format!("{}?error={}", self.path(), RawStr::new(text).percent_encode())
    }
}

impl RedirectResponse {
    pub fn success(page: Page, message: &str) -> Self {
        RedirectResponse::Success {
            message: message.to_string(),
            redirect_url: page.message_url(message),
        }
    }

    pub fn failure(page: Page, error: &str) -> Self {
        RedirectResponse::Failure {
            error: error.to_string(),
            redirect_url: page.error_url(error),
        }
    }
}

pub type Redirected = status::Custom<Json<RedirectResponse>>;

pub fn redirect_ok(page: Page, message: &str) -> Redirected {
    status::Custom(Status::Ok, Json(RedirectResponse::success(page, message)))
}

pub fn redirect_err(code: Status, page: Page, error: &str) -> Redirected {
    status::Custom(code, Json(RedirectResponse::failure(page, error)))
}

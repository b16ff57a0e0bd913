//! JSON body guard that logs what it parsed.
//!
//! `LoggedJson<T>` replaces `Json<T>` on mutating endpoints so every change
//! request leaves a trace in the server log. Do not use it for bodies that
//! carry credentials.

use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{
    Data, Request,
    data::{self, FromData},
};

/// Longest body rendered into a log line before it is cut.
const MAX_LOGGED_BODY: usize = 2048;

pub struct LoggedJson<T>(pub T);

impl<T> LoggedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for LoggedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Renders a body for the log, cutting it at a char boundary.
fn render_body<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(mut rendered) => {
            if rendered.len() > MAX_LOGGED_BODY {
                let mut cut = MAX_LOGGED_BODY;
                while !rendered.is_char_boundary(cut) {
                    cut -= 1;
                }
                rendered.truncate(cut);
                rendered.push_str("...");
            }
            rendered
        }
        Err(_) => "<failed to serialize>".to_string(),
    }
}

#[rocket::async_trait]
impl<'r, T: Deserialize<'r> + Serialize> FromData<'r> for LoggedJson<T> {
    type Error = rocket::serde::json::Error<'r>;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            data::Outcome::Success(json_data) => {
                info!(
                    "Request body: {} {} | {}",
                    req.method().as_str(),
                    req.uri().path(),
                    render_body(&json_data.0)
                );
                data::Outcome::Success(LoggedJson(json_data.into_inner()))
            }
            data::Outcome::Error((status, e)) => {
                warn!(
                    "Rejected request body: {} {} | {:?}",
                    req.method().as_str(),
                    req.uri().path(),
                    e
                );
                data::Outcome::Error((status, e))
            }
            data::Outcome::Forward(f) => data::Outcome::Forward(f),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LoggedJson<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

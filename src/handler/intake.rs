//! Per-request intake handler
//!
//! One `RequestHandler` lives for exactly one request: it owns that request's
//! database connection and produces a single `Outcome`.

use hyper::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::config::{AppState, ResponseMode};
use crate::error::IntakeError;
use crate::http::{self, Envelope};
use crate::intake::{FormFields, Submission, ValidatedForm};
use crate::logger;
use crate::storage::StoreConnection;

/// Final answer for a request; emitting it ends processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(Envelope),
    Redirect(String),
}

impl Outcome {
    fn reply(status: StatusCode, message: &str) -> Self {
        Self::Reply(Envelope::new(status, message))
    }

    /// Log the cause and map the error onto its public envelope
    pub fn from_error(err: &IntakeError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            logger::log_error(&err.to_string());
        } else {
            logger::log_warning(&err.to_string());
        }
        Self::reply(status, err.public_message())
    }

    pub fn into_response(self) -> hyper::Response<http_body_util::Full<hyper::body::Bytes>> {
        match self {
            Self::Reply(envelope) => http::build_envelope_response(&envelope),
            Self::Redirect(target) => http::build_redirect_response(&target),
        }
    }
}

pub struct RequestHandler<'a> {
    state: &'a AppState,
    conn: Box<dyn StoreConnection>,
}

impl<'a> RequestHandler<'a> {
    /// Open this request's connection; no route runs without one
    pub async fn connect(state: &'a AppState) -> Result<Self, IntakeError> {
        let conn = state
            .store
            .connect()
            .await
            .map_err(IntakeError::DatabaseUnavailable)?;
        Ok(Self { state, conn })
    }

    /// Dispatch on method, then close the connection. `fields` is only read
    /// for POST.
    pub async fn handle(mut self, method: &Method, fields: &FormFields) -> Outcome {
        let outcome = self.dispatch(method, fields).await;
        release(self.conn).await;
        outcome
    }

    /// Answer with `err` without running the pipeline, closing the connection
    pub async fn reject(self, err: &IntakeError) -> Outcome {
        let outcome = Outcome::from_error(err);
        release(self.conn).await;
        outcome
    }

    async fn dispatch(&mut self, method: &Method, fields: &FormFields) -> Outcome {
        match *method {
            Method::GET => Outcome::reply(StatusCode::OK, "GET request successful"),
            Method::POST => match self.intake(fields).await {
                Ok(outcome) => outcome,
                Err(e) => Outcome::from_error(&e),
            },
            Method::PATCH => Outcome::reply(StatusCode::OK, "PATCH request successful"),
            Method::DELETE => Outcome::reply(StatusCode::OK, "DELETE request successful"),
            _ => {
                logger::log_warning(&format!("Method not allowed: {method}"));
                Outcome::reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            }
        }
    }

    /// validate -> identify -> persist -> notify -> respond
    async fn intake(&mut self, fields: &FormFields) -> Result<Outcome, IntakeError> {
        let form = ValidatedForm::from_fields(fields)?;
        let mode = self.state.config.intake.response_mode;

        let early_target = if mode == ResponseMode::Redirect
            && self.state.config.intake.require_routable_tag
        {
            Some(self.redirect_target(&form.tags)?)
        } else {
            None
        };

        let submission = form.identify();
        self.conn
            .insert(&submission)
            .await
            .map_err(IntakeError::Persistence)?;
        logger::log_submission_saved(&submission.id, &self.state.config.database.table);

        if let Some(notifier) = &self.state.notifier {
            notifier.notify(&submission).await?;
        }

        match mode {
            ResponseMode::Json => Ok(Outcome::Reply(saved_envelope(&submission))),
            ResponseMode::Redirect => {
                let target = match early_target {
                    Some(target) => target,
                    None => self.redirect_target(&submission.tags)?,
                };
                Ok(Outcome::Redirect(target))
            }
        }
    }

    fn redirect_target(&self, tags: &str) -> Result<String, IntakeError> {
        self.state
            .redirect_targets
            .as_ref()
            .and_then(|targets| targets.route(tags))
            .map(str::to_string)
            .ok_or_else(|| IntakeError::UnknownTag(tags.to_string()))
    }
}

/// Close a per-request connection; a failure is logged, never surfaced
pub async fn release(conn: Box<dyn StoreConnection>) {
    if let Err(e) = conn.close().await {
        logger::log_warning(&format!("Failed to close database connection: {e}"));
    }
}

fn saved_envelope(submission: &Submission) -> Envelope {
    let mut data = Map::new();
    data.insert(
        "subscriber_code".to_string(),
        Value::String(submission.id.clone()),
    );
    Envelope::new(StatusCode::OK, "POST request successful and data saved").with_data(data)
}

//! Subscription API handlers.
//!
//! `PUT /subscribe` and `GET /unsubscribe` are the two halves of the reader
//! lifecycle. Subscribe is challenge-gated and deliberately quiet about
//! duplicates; unsubscribe renders a human-facing page because readers reach
//! it from a link in their email.

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use newsletter_core::item::ItemType;
use newsletter_core::storage::{StoreError, ValidationError};
use newsletter_core::subscription;

use crate::{challenge::SCORE_THRESHOLD, handlers::AppError, state::AppState};

/// Template wrapper that converts Askama templates into HTML responses.
struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {err}"),
            )
                .into_response(),
        }
    }
}

/// Page shown after an unsubscribe attempt, successful or not.
#[derive(Template)]
#[template(path = "unsubscribe.html")]
struct UnsubscribePage {
    message: String,
}

fn unsubscribe_page(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        HtmlTemplate(UnsubscribePage {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Light structural check on an email address.
fn is_valid_email(address: &str) -> bool {
    if address.contains(char::is_whitespace) {
        return false;
    }
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// GET / - Service banner.
#[axum::debug_handler]
pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "pong" }))
}

/// JSON body of a subscribe request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email_address: String,
    pub recaptcha_challenge_token: String,
}

/// PUT /subscribe - Subscribe an email address to the newsletter.
///
/// Requests scored at or below [`SCORE_THRESHOLD`] by the challenge verifier
/// are dropped without a trace. Duplicate subscriptions also answer 200, so
/// the endpoint never reveals which addresses are on the list.
#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<StatusCode, AppError> {
    if !is_valid_email(&request.email_address) {
        return Err(StoreError::Validation(ValidationError::new(
            ItemType::Subscription,
            "email address is not valid",
        ))
        .into());
    }
    if request.recaptcha_challenge_token.is_empty() {
        return Err(StoreError::Validation(ValidationError::new(
            ItemType::Subscription,
            "challenge token cannot be empty",
        ))
        .into());
    }

    let score = state
        .challenge
        .verify(&request.recaptcha_challenge_token)
        .await
        .context("Recaptcha verification failed")?;

    if score <= SCORE_THRESHOLD {
        tracing::info!(score, "Dropping low-score subscribe request");
        return Ok(StatusCode::OK);
    }

    if subscription::find(state.store.as_ref(), &request.email_address)
        .await?
        .is_some()
    {
        tracing::debug!("Subscription already exists");
        return Ok(StatusCode::OK);
    }

    match subscription::create(state.store.as_ref(), &request.email_address).await {
        Ok(created) => {
            tracing::info!(id = %created.id, "Subscription created");
            Ok(StatusCode::OK)
        }
        // A concurrent subscribe for the same address got there first.
        Err(StoreError::AlreadyExists { .. }) => Ok(StatusCode::OK),
        Err(err) => Err(err.into()),
    }
}

/// Query parameters of an unsubscribe link.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeParams {
    pub id: Option<String>,
    pub email_address: Option<String>,
}

/// GET /unsubscribe - Remove a subscription via an emailed link.
///
/// Always renders the unsubscribe page; the status code and message vary
/// with the outcome. An address that is already gone still lands on the
/// success page, so stale links keep working.
#[axum::debug_handler]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(params): Query<UnsubscribeParams>,
) -> Response {
    let Some(id) = params.id else {
        return unsubscribe_page(
            StatusCode::BAD_REQUEST,
            "required query parameter id is missing",
        );
    };
    let Some(email_address) = params.email_address else {
        return unsubscribe_page(
            StatusCode::BAD_REQUEST,
            "required query parameter emailAddress is missing",
        );
    };
    let Ok(id) = id.parse::<Uuid>() else {
        return unsubscribe_page(
            StatusCode::BAD_REQUEST,
            "query parameter id is not a valid subscription id",
        );
    };
    if !is_valid_email(&email_address) {
        return unsubscribe_page(
            StatusCode::BAD_REQUEST,
            "query parameter emailAddress is not a valid email address",
        );
    }

    match subscription::remove(state.store.as_ref(), &email_address, id).await {
        // A second click on the same link lands on the success page too.
        Ok(()) | Err(StoreError::NotFound { .. }) => unsubscribe_page(
            StatusCode::OK,
            "You have successfully unsubscribed and will no longer receive emails from us.",
        ),
        Err(err) => {
            tracing::error!(error = %err, "Failed to delete subscription");
            unsubscribe_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong while unsubscribing. Please try again later.",
            )
        }
    }
}

/// GET /stats - Aggregate subscription statistics.
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let subscriptions = subscription::count(state.store.as_ref()).await?;

    Ok(Json(serde_json::json!({ "subscriptions": subscriptions })))
}

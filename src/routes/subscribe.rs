use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use serde::Deserialize;

use super::error_chain_fmt;
use crate::configuration::ConfirmationMode;
use crate::configuration::ConfirmationSettings;
use crate::domain::ConfirmationToken;
use crate::domain::PendingConfirmation;
use crate::domain::SubscriberEmail;
use crate::provider_client::ContactLookup;
use crate::provider_client::ProviderClient;
use crate::startup::AppBaseUrl;
use crate::startup::SiteUrl;
use crate::token_store::TokenStore;

const SUCCESS_MESSAGE: &str = "Subscription successful. Please check your email for confirmation.";

/// `email` is optional so that a missing field surfaces as our own 400, not
/// as a deserialization error.
#[derive(Deserialize)]
pub struct SubscribeBody {
    email: Option<String>,
}

/// The `Display` of each variant is what the caller sees; sources only end up
/// in the logs.
#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Email is required.")]
    ValidationError(#[source] anyhow::Error),
    #[error("You've already subscribed!")]
    AlreadySubscribed,
    #[error("Something went wrong while checking.")]
    LookupError(#[source] reqwest::Error),
    #[error("Subscription failed. Please try again.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::AlreadySubscribed => StatusCode::BAD_REQUEST,
            Self::LookupError(_) | Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": self.to_string() }))
    }
}

/// Used as `JsonConfig::error_handler`, so that a missing or malformed body is
/// answered like a missing email.
pub fn reject_malformed_body(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    SubscribeError::ValidationError(anyhow::anyhow!("malformed body: {err}")).into()
}

#[tracing::instrument(
    name = "Sending welcome email",
    skip(provider, email, site_url)
)]
async fn send_welcome_email(
    provider: &ProviderClient,
    email: &SubscriberEmail,
    site_url: &str,
) -> Result<(), reqwest::Error> {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; text-align: center;">
  <h2>Welcome!</h2>
  <p>Thank you for subscribing to our announcements. Stay tuned for updates from <strong>{name}</strong>.</p>
  <p style="font-size: 14px;">Click <a href="{site_url}">here</a> to visit our site.</p>
</div>"#,
        name = provider.sender().name(),
    );
    provider
        .send_email(email, "You're Subscribed!", &html)
        .await
}

#[tracing::instrument(
    name = "Sending confirmation email",
    skip(provider, email, base_url, token)
)]
async fn send_confirmation_email(
    provider: &ProviderClient,
    email: &SubscriberEmail,
    base_url: &str,
    token: &ConfirmationToken,
) -> Result<(), reqwest::Error> {
    let confirm_link = format!("{base_url}/confirm?token={}", token.as_ref());
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; text-align: center;">
  <h2>One more step</h2>
  <p>Please confirm your subscription to <strong>{name}</strong> by clicking <a href="{confirm_link}">here</a>.</p>
  <p style="font-size: 12px; color: #777;">If you did not ask to subscribe, you can ignore this email.</p>
</div>"#,
        name = provider.sender().name(),
    );
    provider
        .send_email(email, "Please confirm your subscription", &html)
        .await
}

/// `POST /subscribe`, with a JSON body `{"email": "..."}`.
///
/// - `direct`: the contact is added to the list and a welcome email is sent.
/// - `double_opt_in`: a token is stored and a confirmation link is emailed;
///   the contact is only added by [`confirm`](super::confirm).
///
/// An address the provider already knows is rejected before anything is
/// written. The add and the email are not compensated: if the email fails,
/// the contact stays in the list and the caller still gets a 500.
///
/// # Request example
///
/// ```sh
///     curl -v -H 'Content-Type: application/json' --data '{"email":"john@foo.com"}' http://127.0.0.1:3000/subscribe
/// ```
#[tracing::instrument(
    name = "Adding new subscriber",
    skip(body, provider, store, mode, base_url, site_url, confirmation),
    fields(
        subscriber_email = tracing::field::Empty,
        mode = ?mode.get_ref(),
    )
)]
pub async fn subscribe(
    body: web::Json<SubscribeBody>,
    provider: web::Data<ProviderClient>,
    store: web::Data<dyn TokenStore>,
    mode: web::Data<ConfirmationMode>,
    base_url: web::Data<AppBaseUrl>,
    site_url: web::Data<SiteUrl>,
    confirmation: web::Data<ConfirmationSettings>,
) -> Result<HttpResponse, SubscribeError> {
    let email = body
        .0
        .email
        .context("no email field")
        .and_then(|e| SubscriberEmail::parse(e).map_err(anyhow::Error::msg))
        .map_err(SubscribeError::ValidationError)?;

    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    match provider
        .get_contact(&email)
        .await
        .map_err(SubscribeError::LookupError)?
    {
        ContactLookup::Found => return Err(SubscribeError::AlreadySubscribed),
        ContactLookup::NotFound => {}
    }

    match mode.get_ref() {
        ConfirmationMode::Direct => {
            provider
                .create_contact(&email)
                .await
                .context("Failed to add contact to list")?;
            send_welcome_email(&provider, &email, &site_url.0)
                .await
                .context("Failed to send welcome email")?;
        }

        ConfirmationMode::DoubleOptIn => {
            let token = ConfirmationToken::generate();
            let ttl = confirmation.token_ttl().map_err(anyhow::Error::msg)?;
            let pending = PendingConfirmation::new(email.clone(), ttl);
            store
                .put(&token, pending)
                .await
                .context("Failed to store confirmation token")?;
            send_confirmation_email(&provider, &email, &base_url.0, &token)
                .await
                .context("Failed to send confirmation email")?;
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": SUCCESS_MESSAGE })))
}

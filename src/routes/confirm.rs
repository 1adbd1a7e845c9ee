use actix_web::error::InternalError;
use actix_web::error::QueryPayloadError;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use anyhow::Context;
use serde::Deserialize;

use super::error_chain_fmt;
use crate::configuration::ConfirmationSettings;
use crate::provider_client::ProviderClient;
use crate::token_store::TokenStore;
use crate::utils::redirect;

#[derive(Deserialize)]
pub struct Parameters {
    token: Option<String>,
}

/// None of these are shown to the caller, who only ever sees the error page.
#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error("No pending confirmation for the supplied token")]
    UnknownToken,
    #[error("Confirmation token has expired")]
    ExpiredToken,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ConfirmError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Consumes `token`: an expired entry is dropped on sight, a valid one only
/// once the contact has been registered. If the provider call fails the entry
/// is kept, so the same link works again until it expires.
#[tracing::instrument(
    name = "Consuming confirmation token",
    skip(token, provider, store),
    fields(subscriber_email = tracing::field::Empty)
)]
async fn consume_token(
    token: &str,
    provider: &ProviderClient,
    store: &dyn TokenStore,
) -> Result<(), ConfirmError> {
    let pending = store
        .get(token)
        .await
        .context("Failed to read confirmation token")?
        .ok_or(ConfirmError::UnknownToken)?;

    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&pending.email),
    );

    if pending.is_expired() {
        store
            .delete(token)
            .await
            .context("Failed to delete expired confirmation token")?;
        return Err(ConfirmError::ExpiredToken);
    }

    provider
        .create_contact(&pending.email)
        .await
        .context("Failed to add confirmed contact to list")?;

    store
        .delete(token)
        .await
        .context("Failed to delete used confirmation token")?;

    Ok(())
}

/// `GET /confirm?token=...`
///
/// Redirects to `success_url` once the contact is in the list, and to
/// `error_url` for anything else. Unknown and expired tokens are
/// indistinguishable from the outside; the actual cause is attached to the
/// response as an error, so that it gets logged.
#[tracing::instrument(name = "Confirming subscriber", skip(params, provider, store, confirmation))]
pub async fn confirm(
    params: web::Query<Parameters>,
    provider: web::Data<ProviderClient>,
    store: web::Data<dyn TokenStore>,
    confirmation: web::Data<ConfirmationSettings>,
) -> Result<HttpResponse, InternalError<ConfirmError>> {
    let outcome = match params.0.token {
        Some(token) => consume_token(&token, &provider, store.get_ref()).await,
        None => Err(ConfirmError::UnknownToken),
    };

    match outcome {
        Ok(()) => Ok(redirect(&confirmation.success_url)),
        Err(e) => Err(InternalError::from_response(
            e,
            redirect(&confirmation.error_url),
        )),
    }
}

/// `QueryConfig` error handler: a query string that cannot be read (e.g. a
/// repeated `token`) is handled like an unknown token.
pub fn reject_malformed_query(
    err: QueryPayloadError,
    req: &HttpRequest,
) -> actix_web::Error {
    tracing::debug!(error = %err, "malformed confirmation query");
    let error_url = req
        .app_data::<web::Data<ConfirmationSettings>>()
        .map(|c| c.error_url.clone())
        .unwrap_or_else(|| "/confirm-error".to_string());
    InternalError::from_response(ConfirmError::UnknownToken, redirect(&error_url)).into()
}

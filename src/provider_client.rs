use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;
use validator::ValidateEmail;

use crate::domain::SubscriberEmail;

/// The "from" of every transactional email. Unlike subscriber addresses, this
/// comes from configuration, so it is held to a real email syntax check.
#[derive(Debug, Clone)]
pub struct Sender {
    name: String,
    email: String,
}

impl Sender {
    pub fn parse(
        name: String,
        email: String,
    ) -> Result<Self, String> {
        match ValidateEmail::validate_email(&email) {
            true => Ok(Self { name, email }),
            false => Err(format!("Invalid sender email: {email:?}")),
        }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn email(&self) -> &str { &self.email }
}

/// Outcome of looking a contact up by email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactLookup {
    Found,
    NotFound,
}

/// Client for the marketing-email provider (contacts + transactional email).
/// Every request carries the static `api-key` header.
pub struct ProviderClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    list_id: u64,
    sender: Sender,
}

// bodies are borrowed to avoid cloning per request

#[derive(Deserialize)]
struct Contact {
    email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContactRequest<'a> {
    email: &'a str,
    list_ids: &'a [u64],
    update_enabled: bool,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: EmailAddress<'a>,
    to: [EmailAddress<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

impl ProviderClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        list_id: u64,
        sender: Sender,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            list_id,
            sender,
        })
    }

    pub fn sender(&self) -> &Sender { &self.sender }

    /// `GET /v3/contacts/{email}`. 404 means the address is not in the
    /// account yet; any other non-2xx status is an error.
    ///
    /// A 2xx response only counts as `Found` if its body names an email.
    #[tracing::instrument(name = "Looking up contact", skip(self))]
    pub async fn get_contact(
        &self,
        email: &SubscriberEmail,
    ) -> Result<ContactLookup, reqwest::Error> {
        let url = format!(
            "{}/v3/contacts/{}",
            self.base_url,
            urlencoding::encode(email.as_ref())
        );
        let resp = self
            .http_client
            .get(&url)
            .header("api-key", self.api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(ContactLookup::NotFound);
        }

        let body = resp.error_for_status()?.bytes().await?;
        let found = serde_json::from_slice::<Contact>(&body)
            .ok()
            .and_then(|c| c.email)
            .is_some();

        match found {
            true => Ok(ContactLookup::Found),
            false => Ok(ContactLookup::NotFound),
        }
    }

    /// `POST /v3/contacts`. Upserts the contact into the configured list.
    #[tracing::instrument(name = "Adding contact to list", skip(self), fields(list_id = self.list_id))]
    pub async fn create_contact(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/v3/contacts", self.base_url);
        let body = CreateContactRequest {
            email: email.as_ref(),
            list_ids: &[self.list_id],
            update_enabled: true,
        };
        self.http_client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// `POST /v3/smtp/email`
    #[tracing::instrument(name = "Sending transactional email", skip(self, html_content))]
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/v3/smtp/email", self.base_url);
        let body = SendEmailRequest {
            sender: EmailAddress {
                name: Some(self.sender.name()),
                email: self.sender.email(),
            },
            to: [EmailAddress {
                name: None,
                email: recipient.as_ref(),
            }],
            subject,
            html_content,
        };
        self.http_client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

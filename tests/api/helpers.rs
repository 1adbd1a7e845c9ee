use std::sync::Arc;

use once_cell::sync::Lazy;
use subscribe_relay::configuration::get_configuration;
use subscribe_relay::configuration::ConfirmationMode;
use subscribe_relay::startup::Application;
use subscribe_relay::telemetry::get_subscriber;
use subscribe_relay::telemetry::init_subscriber;
use subscribe_relay::token_store::InMemoryTokenStore;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::MockBuilder;
use wiremock::MockServer;

/// Init the tracing subscriber once only.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different types, hence the match arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    /// Stands in for the provider API
    pub provider_server: MockServer,
    /// Same store the app uses, for inspection
    pub store: InMemoryTokenStore,
    /// Does not follow redirects
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_subscribe(
        &self,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscribe", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    /// Like `post_subscribe`, for bodies that are not valid JSON
    pub async fn post_subscribe_raw(
        &self,
        body: String,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscribe", self.addr))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_confirm(
        &self,
        token: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}/confirm", self.addr))
            .query(&[("token", token)])
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get(
        &self,
        route: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}{route}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    /// Extract the (only) link from the `htmlContent` of an email sent to the
    /// provider, pointed at the test server's port.
    pub fn get_confirmation_link(
        &self,
        email_req: &wiremock::Request,
    ) -> reqwest::Url {
        let body: serde_json::Value = serde_json::from_slice(&email_req.body).unwrap();
        let html = body["htmlContent"].as_str().unwrap();

        let links: Vec<_> = linkify::LinkFinder::new()
            .links(html)
            .filter(|l| *l.kind() == linkify::LinkKind::Url)
            .collect();
        assert_eq!(links.len(), 1);

        let mut link = reqwest::Url::parse(links[0].as_str()).unwrap();
        // don't call random APIs on the web
        assert_eq!(link.host_str().unwrap(), "127.0.0.1");
        link.set_port(Some(self.port)).unwrap();
        link
    }

    /// Every `POST /v3/smtp/email` received so far
    pub async fn sent_emails(&self) -> Vec<wiremock::Request> {
        self.provider_server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/v3/smtp/email")
            .collect()
    }
}

/// `GET /v3/contacts/{email}`
pub fn contact_lookup() -> MockBuilder {
    Mock::given(method("GET")).and(path_regex(r"^/v3/contacts/.+$"))
}

/// `POST /v3/contacts`
pub fn contact_create() -> MockBuilder { Mock::given(method("POST")).and(path("/v3/contacts")) }

/// `POST /v3/smtp/email`
pub fn email_send() -> MockBuilder { Mock::given(method("POST")).and(path("/v3/smtp/email")) }

pub async fn spawn_app() -> TestApp { spawn_app_with(ConfirmationMode::Direct).await }

/// Spawn the app on a random port, with the provider pointed at a fresh
/// `MockServer`.
///
/// Returns the address to which the server was bound, in the form
/// `http://127.0.0.1:{port}`. The `http://` prefix is important, as this is
/// the address that clients will send requests to.
pub async fn spawn_app_with(mode: ConfirmationMode) -> TestApp {
    Lazy::force(&TRACING);

    let provider_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().unwrap();

        // port 0 is reserved by the OS; the server will be spawned on an address with a
        // random available port
        cfg.application.host = "127.0.0.1".to_string();
        cfg.application.port = 0;
        // the port is patched in by `get_confirmation_link`
        cfg.application.base_url = "http://127.0.0.1".to_string();
        cfg.application.site_url = "https://example.com/contact".to_string();
        cfg.application.confirmation = mode;

        cfg.provider.base_url = provider_server.uri();
        // short enough for tests that make the provider hang
        cfg.provider.timeout_milliseconds = 1000;

        cfg
    };

    let store = InMemoryTokenStore::new();
    let app = Application::build_with_store(cfg, Arc::new(store.clone()))
        .await
        .unwrap();

    let port = app.get_port();
    let addr = format!("http://127.0.0.1:{port}");
    tokio::spawn(app.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        port,
        provider_server,
        store,
        api_client,
    }
}

pub fn check_redirect(
    resp: &reqwest::Response,
    location: &str,
) {
    assert_eq!(resp.status().as_u16(), 303);
    assert_eq!(resp.headers().get("Location").unwrap(), location);
}

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use tracing_actix_web::TracingLogger;

use crate::configuration::ConfirmationMode;
use crate::configuration::ConfirmationSettings;
use crate::configuration::Settings;
use crate::middleware::cors;
use crate::provider_client::ProviderClient;
use crate::routes::confirm;
use crate::routes::confirm_error_page;
use crate::routes::confirmed_page;
use crate::routes::health_check;
use crate::routes::reject_malformed_query;
use crate::routes::reject_malformed_body;
use crate::routes::subscribe;
use crate::token_store::InMemoryTokenStore;
use crate::token_store::TokenStore;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Pending confirmations are kept in memory.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        Self::build_with_store(cfg, Arc::new(InMemoryTokenStore::new())).await
    }

    pub async fn build_with_store(
        cfg: Settings,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // port 0 means the OS picked one; this is how callers find out which
        let port = listener.local_addr()?.port();

        let provider = cfg.provider.client()?;

        let server = run(
            listener,
            provider,
            store,
            cfg.application.confirmation,
            cfg.application.base_url,
            cfg.application.site_url,
            cfg.application.allowed_origin,
            cfg.confirmation,
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

// newtypes, since app data is looked up by type

/// Public address of this relay
pub struct AppBaseUrl(pub String);

/// Public address of the site hosting the subscription form
pub struct SiteUrl(pub String);

pub struct AllowedOrigin(pub String);

/// Routes:
///
/// - `GET /health_check`
/// - `POST /subscribe`
/// - `GET /confirm` (double opt-in only)
/// - `GET /confirmed`, `GET /confirm-error`
#[allow(clippy::too_many_arguments)]
pub fn run(
    listener: TcpListener,
    provider: ProviderClient,
    store: Arc<dyn TokenStore>,
    mode: ConfirmationMode,
    base_url: String,
    site_url: String,
    allowed_origin: String,
    confirmation: ConfirmationSettings,
) -> Result<Server, anyhow::Error> {
    tracing::info!(?mode, %base_url, "starting subscription relay");

    let provider = Data::new(provider);
    let store: Data<dyn TokenStore> = Data::from(store);
    let mode = Data::new(mode);
    let base_url = Data::new(AppBaseUrl(base_url.trim_end_matches('/').to_string()));
    let site_url = Data::new(SiteUrl(site_url));
    let allowed_origin = Data::new(AllowedOrigin(allowed_origin));
    let confirmation = Data::new(confirmation);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(from_fn(cors))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscribe", web::post().to(subscribe))
            .route("/confirmed", web::get().to(confirmed_page))
            .route("/confirm-error", web::get().to(confirm_error_page))
            .configure(|c| {
                if *mode.get_ref() == ConfirmationMode::DoubleOptIn {
                    c.route("/confirm", web::get().to(confirm));
                }
            })
            .app_data(web::JsonConfig::default().error_handler(reject_malformed_body))
            .app_data(web::QueryConfig::default().error_handler(reject_malformed_query))
            .app_data(provider.clone())
            .app_data(store.clone())
            .app_data(mode.clone())
            .app_data(base_url.clone())
            .app_data(site_url.clone())
            .app_data(allowed_origin.clone())
            .app_data(confirmation.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

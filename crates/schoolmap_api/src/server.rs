//! HTTP server bootstrap.

use crate::routes::configure_routes;
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use schoolmap_core::StoreSession;
use serde::{Deserialize, Serialize};

/// `[server]` section of the application config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Serves the directory API until the process receives a shutdown signal.
///
/// The store session is shared by every worker; its connection opens on the
/// first request, so an unreachable store surfaces per request instead of
/// aborting startup.
pub async fn run_server(settings: &ServerSettings, session: StoreSession) -> std::io::Result<()> {
    let bind_addr = settings.bind_addr();
    let session = web::Data::new(session);

    info!(
        "event=server_start module=api status=ok bind={} store={:?}",
        bind_addr,
        session.location()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(session.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("event=server_stop module=api status=ok bind={}", bind_addr);
    Ok(())
}

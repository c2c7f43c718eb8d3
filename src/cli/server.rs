use actix_web::web;
use clap::Parser;
use error_stack::{Result, ResultExt};
use std::net::IpAddr;
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::info;
use tracing_actix_web::TracingLogger;

use huddle::database::migrations;
use huddle::http::util::QuieterRootSpanBuilder;
use huddle::{config, http, App};

#[derive(Debug, Error)]
#[error("Could not start Huddle HTTP server")]
pub struct StartServerError;

/// Expose the Huddle API HTTP server
#[derive(Debug, Parser)]
pub struct ServerCommand {
    #[clap(long)]
    pub address: Option<IpAddr>,
    #[clap(long)]
    pub port: Option<u16>,
    #[clap(long)]
    pub workers: Option<NonZeroUsize>,
}

pub fn run(args: ServerCommand) -> Result<(), StartServerError> {
    let mut config = config::Server::load().change_context(StartServerError)?;
    args.override_config(&mut config);

    super::init_tracing();
    super::build_runtime()
        .change_context(StartServerError)
        .attach_printable("could not build tokio runtime")?
        .block_on(start(config))
}

#[tracing::instrument(skip_all, name = "server.run")]
async fn start(config: config::Server) -> Result<(), StartServerError> {
    let app = App::new(config).await.change_context(StartServerError)?;
    migrations::run_pending(&app.primary_db)
        .await
        .change_context(StartServerError)?;

    let addr = (app.config.http.ip, app.config.http.port);
    let workers = app.config.http.workers;
    info!(
        "Huddle HTTP server is listening at http://{}:{} with {workers} workers",
        addr.0, addr.1
    );

    let data = web::Data::new(app);
    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(data.clone())
            .wrap(TracingLogger::<QuieterRootSpanBuilder>::new())
            .configure(http::controllers::configure)
    })
    .workers(workers)
    .bind(addr)
    .change_context(StartServerError)
    .attach_printable("could not bind server with address and port")?
    .run()
    .await
    .change_context(StartServerError)
}

impl ServerCommand {
    fn override_config(&self, config: &mut config::Server) {
        // override server configurations if set by the cli
        if let Some(address) = self.address {
            config.http.ip = address;
        }

        if let Some(port) = self.port {
            config.http.port = port;
        }

        if let Some(workers) = self.workers {
            config.http.workers = workers.get();
        }
    }
}

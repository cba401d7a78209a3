#![deny(clippy::all)]
#![deny(clippy::dbg_macro)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Error;
use env_logger::{Builder, Env};
use log::{error, info};
use providers::{EuclidClient, RpcWalletReader};
use std::sync::Arc;
use structopt::StructOpt;
use vouchers::{Config, RefreshController, WalletSession};

mod api;

use api::service::AppState;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "Voucher balances params",
    about = "Cross-chain voucher balance dashboard backend."
)]
struct Opt {
    /// Set logging level
    #[structopt(short, long, default_value = "warn")]
    log: String,

    /// Set IP address
    #[structopt(long, short, default_value = "127.0.0.1")]
    ip: String,

    /// Set port number
    #[structopt(long, short, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> ! {
    dotenv::dotenv().ok();

    let opt = Opt::from_args();

    Builder::from_env(Env::default().default_filter_or(opt.log)).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    loop {
        if let Err(e) = try_main(&opt.ip, opt.port, config.clone()).await {
            error!("{e}");
        } else {
            info!("Exiting gracefully");
            std::process::exit(0);
        }
    }
}

async fn try_main(ip: &str, port: u16, config: Config) -> Result<(), Error> {
    let rpc = config
        .evm_rpc_url
        .as_deref()
        .map(RpcWalletReader::new)
        .transpose()
        .map_err(Error::msg)?;
    let client = Arc::new(EuclidClient::new(config.graphql_endpoint.clone()));

    info!(
        "Balances from {}, refreshed every {:?}",
        client.endpoint(),
        config.refresh_interval
    );

    let controller = RefreshController::new(client.clone(), client, config);
    let session = WalletSession::new();
    controller.attach(&session);

    let state = web::Data::new(AppState {
        controller: controller.clone(),
        session,
        rpc,
    });

    info!("Listening on http://{}:{}", ip, port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::router::configure)
    })
    .bind((ip, port));

    let served = match server {
        Ok(server) => server.run().await.map_err(Error::msg),
        Err(e) => Err(Error::msg(e)),
    };

    controller.dispose();

    served
}

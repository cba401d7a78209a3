use crate::api::service::{self, AppState, ConnectWalletRequest};
use actix_web::{delete, get, post, web, HttpResponse, Responder};

#[get("/balances")]
async fn balances(app: web::Data<AppState>) -> impl Responder {
    web::Json(service::dashboard(&app))
}

#[post("/refresh")]
async fn refresh(app: web::Data<AppState>) -> impl Responder {
    log::info!("refresh requested");
    app.controller.request_refresh();

    HttpResponse::Accepted().finish()
}

#[post("/wallet")]
async fn connect_wallet(
    app: web::Data<AppState>,
    body: web::Json<ConnectWalletRequest>,
) -> impl Responder {
    log::info!("connect_wallet - {:?}", body);

    match service::connect_wallet(&app, body.into_inner()).await {
        Ok(account) => HttpResponse::Ok().json(account),
        Err(e) => HttpResponse::BadGateway().json(ErrorBody {
            error: e.to_string(),
        }),
    }
}

#[delete("/wallet")]
async fn disconnect_wallet(app: web::Data<AppState>) -> impl Responder {
    app.session.disconnect();

    HttpResponse::NoContent().finish()
}

#[delete("/error")]
async fn dismiss_error(app: web::Data<AppState>) -> impl Responder {
    app.controller.dismiss_error();

    HttpResponse::NoContent().finish()
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(balances)
        .service(refresh)
        .service(connect_wallet)
        .service(disconnect_wallet)
        .service(dismiss_error);
}

#[cfg(test)]
mod test {
    use super::configure;
    use crate::api::service::AppState;
    use actix_web::{http::StatusCode, test, web, App};
    use providers::EuclidClient;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use vouchers::{Config, RefreshController, WalletSession};

    fn app_state() -> web::Data<AppState> {
        let client = Arc::new(EuclidClient::new("http://127.0.0.1:9/graphql"));

        web::Data::new(AppState {
            controller: RefreshController::new(client.clone(), client, Config::default()),
            session: WalletSession::new(),
            rpc: None,
        })
    }

    #[actix_web::test]
    async fn fresh_dashboard_is_idle_and_empty() {
        let app =
            test::init_service(App::new().app_data(app_state()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/balances").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["phase"], json!("idle"));
        assert_eq!(body["loading"], json!(false));
        assert_eq!(body["chains"], json!([]));
        assert_eq!(
            body["stats"],
            json!({ "totalBalanceUsd": 0.0, "uniqueTokenCount": 0, "activeChainCount": 0 })
        );
        assert_eq!(body["error"], Value::Null);
        assert_eq!(body["wallet"], json!({}));
    }

    #[actix_web::test]
    async fn wallet_connects_and_disconnects() {
        let state = app_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/wallet")
            .set_json(json!({
                "address": "0xe43878ce78934fe8007748ff481f03b8ee3b97de",
                "chainId": 137
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let wallet = state.session.current();
        assert_eq!(wallet.chain_id, Some(137));
        assert_eq!(
            wallet.address_hex().as_deref(),
            Some("0xe43878ce78934fe8007748ff481f03b8ee3b97de")
        );

        let res = test::call_service(
            &app,
            test::TestRequest::delete().uri("/wallet").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(!state.session.current().is_connected());
    }

    #[actix_web::test]
    async fn refresh_is_accepted_and_error_can_be_dismissed() {
        let state = app_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/refresh").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::ACCEPTED);

        // no wallet connected, so the refresh fails without touching the network
        let mut rx = state.controller.subscribe();
        while state.controller.state().error.is_none() {
            rx.changed().await.unwrap();
        }

        let res = test::call_service(
            &app,
            test::TestRequest::delete().uri("/error").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.controller.state().error, None);
    }

    #[actix_web::test]
    async fn malformed_wallet_address_is_rejected() {
        let app =
            test::init_service(App::new().app_data(app_state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/wallet")
            .set_json(json!({ "address": "not-an-address" }))
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}

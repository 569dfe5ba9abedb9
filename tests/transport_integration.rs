//! The service over real sockets and the reqwest transport.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::json;

use resilient_api::error::TransportErrorCode;
use resilient_api::{ApiError, ApiService, Session};

mod common;
use common::{start_programmable_backend, test_config};

#[tokio::test]
async fn test_retry_on_503_then_success() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let addr = start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                (503, json!({"message": "warming up"}).to_string())
            } else {
                (200, json!({"success": true, "data": [{"id": "pro", "nome": "Pro"}]}).to_string())
            }
        }
    })
    .await;

    let service = ApiService::new(test_config(&format!("http://{}", addr))).unwrap();
    let plans = service.get_plans().await.expect("should succeed after retries");

    assert_eq!(plans[0].nome, "Pro");
    assert_eq!(call_count.load(Ordering::SeqCst), 3);
    let health = service.get_system_health();
    assert_eq!(health.circuit_breakers["GET /api/plans"].failure_count, 0);
    assert_eq!(health.cache_stats.size, 1);
}

#[tokio::test]
async fn test_bearer_token_and_session_teardown() {
    let saw_bearer = Arc::new(AtomicBool::new(false));
    let flag = saw_bearer.clone();
    let addr = start_programmable_backend(move |head| {
        let flag = flag.clone();
        async move {
            let lower = head.to_ascii_lowercase();
            if lower.contains("authorization: bearer tok-9") {
                flag.store(true, Ordering::SeqCst);
            }
            assert!(lower.contains("x-request-id:"));
            (401, json!({"message": "Token expirado"}).to_string())
        }
    })
    .await;

    let torn_down = Arc::new(AtomicBool::new(false));
    let td = torn_down.clone();
    let session = Arc::new(Session::new().with_teardown(move || td.store(true, Ordering::SeqCst)));
    session.set_token("tok-9");

    let service = ApiService::builder(test_config(&format!("http://{}", addr)))
        .session(session.clone())
        .build()
        .unwrap();

    let err = service.get_profile().await.unwrap_err();

    assert_eq!(err, ApiError::Http { status: 401, message: "Token expirado".into() });
    assert!(saw_bearer.load(Ordering::SeqCst));
    assert!(torn_down.load(Ordering::SeqCst));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_query_params_reach_backend() {
    let addr = start_programmable_backend(|head| async move {
        let request_line = head.lines().next().unwrap_or_default().to_string();
        (200, json!({ "line": request_line }).to_string())
    })
    .await;

    let service = ApiService::new(test_config(&format!("http://{}", addr))).unwrap();
    let value = service
        .request_value(
            reqwest::Method::GET,
            "/api/blocos",
            resilient_api::RequestOptions::new().param("cargo", "Analista"),
        )
        .await
        .unwrap();

    assert_eq!(value["line"], "GET /api/blocos?cargo=Analista HTTP/1.1");
}

#[tokio::test]
async fn test_refused_connection_is_transient() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = test_config(&format!("http://{}", addr));
    config.retries.max_retries = 1;
    let service = ApiService::new(config).unwrap();

    let err = service.get_news().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Transport { code: TransportErrorCode::ConnectionRefused, .. }
    ));
    assert!(err.is_transient());
    assert_eq!(
        service.get_system_health().circuit_breakers["GET /api/news"].failure_count,
        2
    );
}

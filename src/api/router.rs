//! HTTP router.
//!
//! Returns a composable `Router`: the two HTML pages at the root and the
//! JSON API nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Cache-Control: no-store (API only) → 2. Access log

use std::sync::Arc;

use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the application router.
pub fn app_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/assessments", post(endpoints::assessments::create))
        .route(
            "/assessments/:id",
            get(endpoints::assessments::view).delete(endpoints::assessments::end),
        )
        .route(
            "/assessments/:id/fields",
            put(endpoints::assessments::set_field),
        )
        .route(
            "/assessments/:id/submit",
            post(endpoints::assessments::submit),
        )
        .route("/assessments/:id/probe", post(endpoints::probe::run))
        .route(
            "/assessments/:id/probe/dismiss",
            post(endpoints::probe::dismiss),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let pages = Router::new()
        .route("/", get(endpoints::pages::landing))
        .route("/assessment", get(endpoints::pages::new_assessment))
        .route(
            "/assessment/:id",
            get(endpoints::pages::assessment).post(endpoints::pages::post_assessment),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    Router::new().nest("/api", api).merge(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::prediction::{MockPredictor, PredictionError, RiskLevel};
    use crate::probe::{INVALID_RESPONSE_MESSAGE, TIMEOUT_MESSAGE};

    fn test_app(mock: MockPredictor) -> (Router, Arc<CoreState>, Arc<MockPredictor>) {
        let mock = Arc::new(mock);
        let core = Arc::new(CoreState::new(AppConfig::default(), mock.clone()));
        (app_router(core.clone()), core, mock)
    }

    fn json_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&body).into_owned()
    }

    async fn create_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/assessments", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    async fn fill_form(app: &Router, id: &str) {
        for (field, value) in [
            ("respiratory_rate", 18.0),
            ("oxygen_saturation", 97.0),
            ("o2_scale", 2.0),
            ("on_oxygen", 0.0),
            ("systolic_bp", 124.0),
            ("heart_rate", 88.0),
            ("temperature", 37.4),
            ("consciousness", 0.0),
        ] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "PUT",
                    &format!("/api/assessments/{id}/fields"),
                    Some(serde_json::json!({ "field": field, "value": value })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{field}");
        }
    }

    // -- API ----------------------------------------------------------------

    #[tokio::test]
    async fn health_reports_ok_and_no_store() {
        let (app, _, _) = test_app(MockPredictor::new());
        let response = app
            .oneshot(json_request("GET", "/api/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["predictor_url"], "mock://predictor");
    }

    #[tokio::test]
    async fn new_session_view_starts_empty() {
        let (app, _, _) = test_app(MockPredictor::new());
        let id = create_session(&app).await;

        let response = app
            .oneshot(json_request("GET", &format!("/api/assessments/{id}"), None))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["progress"], 7.0);
        assert_eq!(json["can_submit"], false);
        assert_eq!(json["fields"].as_array().unwrap().len(), 8);
        assert_eq!(json["fields"][0]["wire_key"], "Respiratory_Rate");
        assert!(json["result"].is_null());
        assert_eq!(json["probe"]["title"], "API Warning");
    }

    #[tokio::test]
    async fn submit_high_risk_end_to_end() {
        let (app, _, mock) = test_app(MockPredictor::new().with_risk(RiskLevel::High));
        let id = create_session(&app).await;
        fill_form(&app, &id).await;

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/submit"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["phase"], "showing_result");
        assert_eq!(json["result"]["risk_level"], "High");
        assert_eq!(json["result"]["display"]["immediate_action"], true);
        assert_eq!(json["progress"], 100.0);
        assert_eq!(mock.predict_calls(), 1);
    }

    #[tokio::test]
    async fn submit_server_error_is_reported_in_view() {
        let (app, _, _) = test_app(MockPredictor::new().with_prediction_error(
            PredictionError::HttpStatus {
                status: 500,
                status_text: "Internal Server Error".into(),
            },
        ));
        let id = create_session(&app).await;
        fill_form(&app, &id).await;

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/submit"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["phase"], "showing_error");
        assert_eq!(json["error"]["kind"], "http_status");
        assert_eq!(
            json["error"]["message"],
            "API Error: 500 - Internal Server Error"
        );
        assert!(json["result"].is_null());
    }

    #[tokio::test]
    async fn incomplete_submit_is_400() {
        let (app, _, mock) = test_app(MockPredictor::new());
        let id = create_session(&app).await;

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/submit"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mock.predict_calls(), 0);
    }

    #[tokio::test]
    async fn null_value_clears_field() {
        let (app, _, _) = test_app(MockPredictor::new());
        let id = create_session(&app).await;
        fill_form(&app, &id).await;

        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/api/assessments/{id}/fields"),
                Some(serde_json::json!({ "field": "heart_rate", "value": null })),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["complete"], false);
        assert!(json["fields"][5]["value"].is_null());
    }

    #[tokio::test]
    async fn invalid_choice_is_400() {
        let (app, _, _) = test_app(MockPredictor::new());
        let id = create_session(&app).await;

        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/api/assessments/{id}/fields"),
                Some(serde_json::json!({ "field": "consciousness", "value": 7 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let (app, _, _) = test_app(MockPredictor::new());

        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                &format!("/api/assessments/{}", uuid::Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request("GET", "/api/assessments/not-a-uuid", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_ends_session() {
        let (app, core, _) = test_app(MockPredictor::new());
        let id = create_session(&app).await;
        assert_eq!(core.session_count(), 1);

        let response = app
            .clone()
            .oneshot(json_request("DELETE", &format!("/api/assessments/{id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(core.session_count(), 0);

        let response = app
            .oneshot(json_request("GET", &format!("/api/assessments/{id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_timeout_then_dismiss() {
        let (app, _, _) = test_app(MockPredictor::new().never_settles());
        let id = create_session(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/probe"),
                None,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["probe"]["open"], true);
        assert_eq!(json["probe"]["message"], TIMEOUT_MESSAGE);

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/probe/dismiss"),
                None,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["probe"]["open"], false);
    }

    #[tokio::test]
    async fn probe_missing_field_shows_invalid_message() {
        let (app, _, _) = test_app(
            MockPredictor::new().with_probe_body(serde_json::json!({ "detail": "Method Not Allowed" })),
        );
        let id = create_session(&app).await;

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/probe"),
                None,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["probe"]["message"], INVALID_RESPONSE_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submit_is_409() {
        let (app, _, _) = test_app(
            MockPredictor::new()
                .with_risk(RiskLevel::Low)
                .with_delay(Duration::from_secs(5)),
        );
        let id = create_session(&app).await;
        fill_form(&app, &id).await;

        let first = tokio::spawn({
            let app = app.clone();
            let uri = format!("/api/assessments/{id}/submit");
            async move { app.oneshot(json_request("POST", &uri, None)).await.unwrap() }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        let second = app
            .oneshot(json_request(
                "POST",
                &format!("/api/assessments/{id}/submit"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let first = first.await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
    }

    // -- Pages --------------------------------------------------------------

    #[tokio::test]
    async fn landing_page_renders_demo() {
        let (app, _, mock) = test_app(MockPredictor::new());
        let response = app
            .oneshot(json_request("GET", "/?demo=3", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("Cache-Control").is_none());
        let html = body_text(response).await;
        assert!(html.contains("97 BPM"));
        assert!(html.contains("Low Risk"));
        assert_eq!(mock.predict_calls() + mock.probe_calls(), 0);
    }

    #[tokio::test]
    async fn assessment_entry_redirects_to_new_session() {
        let (app, core, _) = test_app(MockPredictor::new());
        let response = app
            .clone()
            .oneshot(json_request("GET", "/assessment", None))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let location = response.headers().get("Location").unwrap().to_str().unwrap().to_string();
        assert!(location.starts_with("/assessment/"));
        assert_eq!(core.session_count(), 1);

        let response = app
            .oneshot(json_request("GET", &location, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Patient Vital Signs Assessment"));
    }

    #[tokio::test]
    async fn stale_page_id_starts_over() {
        let (app, _, _) = test_app(MockPredictor::new());
        let response = app
            .oneshot(json_request(
                "GET",
                &format!("/assessment/{}", uuid::Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get("Location").unwrap(), "/assessment");
    }

    #[tokio::test]
    async fn form_post_submits_and_renders_result() {
        let (app, _, mock) = test_app(MockPredictor::new().with_risk(RiskLevel::Medium));
        let id = create_session(&app).await;

        let form = "respiratory_rate=18&oxygen_saturation=97&o2_scale=2&on_oxygen=0\
                    &systolic_bp=124&heart_rate=88&temperature=37.4&consciousness=0&action=submit";
        let request = Request::builder()
            .method("POST")
            .uri(format!("/assessment/{id}"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(mock.predict_calls(), 1);
        assert_eq!(mock.last_payload().unwrap().heart_rate, 88.0);

        let response = app
            .oneshot(json_request("GET", &format!("/assessment/{id}"), None))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Medium Risk"));
        assert!(html.contains("Moderate risk detected"));
    }
}

//! API routes

use axum::{
    routing::{patch, post},
    Router,
};

use crate::extractors::AppState;
use crate::handlers::{breakdowns, job_cards, orders, registrations};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_router())
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/customers", post(registrations::register_customer))
        .route("/appointments", post(registrations::book_appointment))
        .route("/employees", post(registrations::register_employee))
        .route("/employees/:id/attendance", post(registrations::record_attendance))
        .nest("/job_cards", job_cards_router())
        .route(
            "/service_records/:id/status",
            patch(job_cards::update_service_record_status),
        )
        .route("/orders/:id/approve", post(orders::approve_order))
        .route("/orders/:id/reject", post(orders::reject_order))
        .nest("/breakdowns", breakdowns_router())
}

fn job_cards_router() -> Router<AppState> {
    Router::new()
        .route("/", post(job_cards::open_job_card))
        .route("/:id/mechanics", post(job_cards::assign_mechanics))
        .route("/:id/status", patch(job_cards::update_job_card_status))
        .route("/:id/orders", post(job_cards::order_parts))
}

fn breakdowns_router() -> Router<AppState> {
    Router::new()
        .route("/", post(breakdowns::request_assistance))
        .route("/:id/accept", post(breakdowns::accept))
        .route("/:id/complete", post(breakdowns::complete))
        .route("/:id/cancel", post(breakdowns::cancel))
        .route("/:id/invoice", post(breakdowns::generate_invoice))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use sc_auth::{Authenticator, JwtService};
    use sc_core::config::WorkflowConfig;
    use sc_core::FixedClock;
    use sc_db::MemoryStore;
    use sc_models::Role;
    use sc_notifications::{LoggingPushSender, MemoryNotificationStore};
    use sc_services::{Services, Stores};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes";

    struct TestApp {
        app: Router,
        jwt: Arc<JwtService>,
    }

    impl TestApp {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            store.put_service("SRV-BREAKDOWN", 5.0).await;
            let services = Services::new(
                Stores::memory(store, Arc::new(MemoryNotificationStore::new())),
                Arc::new(LoggingPushSender),
                Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap())),
                &WorkflowConfig::default(),
            );
            let jwt = Arc::new(JwtService::new(SECRET));
            let state = AppState::new(services, Authenticator::new(jwt.clone()));

            Self {
                app: router().with_state(state),
                jwt,
            }
        }

        fn token(&self, subject: &str, role: Role) -> String {
            self.jwt.create_token(subject, role, None, 3600).unwrap()
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(value) => {
                    request = request.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .app
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(Method::POST, "/api/v1/breakdowns/1/accept", None, None)
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["errorIdentifier"]
            .as_str()
            .unwrap()
            .ends_with(":Unauthenticated"));
    }

    #[tokio::test]
    async fn test_register_employee() {
        let app = TestApp::new().await;
        let admin = app.token("A-001", Role::Admin);
        let input = json!({
            "name": "Nimal Silva",
            "email": "nimal@example.com",
            "role": "Mechanic"
        });

        let (status, body) = app
            .send(Method::POST, "/api/v1/employees", Some(&admin), Some(input.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "M-001");

        let mechanic = app.token("M-001", Role::Mechanic);
        let (status, body) = app
            .send(Method::POST, "/api/v1/employees", Some(&mechanic), Some(input))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["errorIdentifier"]
            .as_str()
            .unwrap()
            .ends_with(":MissingPermission"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = TestApp::new().await;
        let admin = app.token("A-001", Role::Admin);
        let (status, _) = app
            .send(
                Method::POST,
                "/api/v1/employees",
                Some(&admin),
                Some(json!({ "name": "No Role" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_breakdown_lifecycle() {
        let app = TestApp::new().await;
        let customer = app.token("C-0001", Role::Customer);
        let driver = app.token("D1", Role::Driver);

        let (status, request) = app
            .send(
                Method::POST,
                "/api/v1/breakdowns",
                Some(&customer),
                Some(json!({ "location": "Galle Road, Colombo 03" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(request["status"], "Pending");
        let id = request["id"].as_i64().unwrap();

        let (status, accepted) = app
            .send(Method::POST, &format!("/api/v1/breakdowns/{id}/accept"), Some(&driver), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["driverId"], "D1");

        let (status, _) = app
            .send(Method::POST, &format!("/api/v1/breakdowns/{id}/complete"), Some(&driver), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, issued) = app
            .send(
                Method::POST,
                &format!("/api/v1/breakdowns/{id}/invoice"),
                Some(&driver),
                Some(json!({ "distanceKm": 10.0, "additionalCharges": 20.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(issued["invoice"]["total"], 70.0);
        assert_eq!(issued["request"]["status"], "Invoice Generated");
    }

    #[tokio::test]
    async fn test_second_accept_conflicts() {
        let app = TestApp::new().await;
        let customer = app.token("C-0001", Role::Customer);
        let (_, request) = app
            .send(
                Method::POST,
                "/api/v1/breakdowns",
                Some(&customer),
                Some(json!({ "location": "Kandy" })),
            )
            .await;
        let uri = format!("/api/v1/breakdowns/{}/accept", request["id"]);

        let first = app.token("D1", Role::Driver);
        let second = app.token("D2", Role::Driver);
        let (status, _) = app.send(Method::POST, &uri, Some(&first), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.send(Method::POST, &uri, Some(&second), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"]["currentStatus"], "InProgress");
    }

    #[tokio::test]
    async fn test_validation_details() {
        let app = TestApp::new().await;
        let customer = app.token("C-0001", Role::Customer);
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/breakdowns",
                Some(&customer),
                Some(json!({ "location": "" })),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["details"]["errors"]["location"].is_array());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let app = TestApp::new().await;
        let cashier = app.token("C-001", Role::Cashier);
        let (status, body) = app
            .send(Method::POST, "/api/v1/orders/PO-0404/approve", Some(&cashier), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["details"]["id"], "PO-0404");
    }
}

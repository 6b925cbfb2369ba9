// tests/api.rs

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use lead_tracker::{
    config::AppState,
    db::InMemoryLeadStore,
    models::{
        auth::{Claims, UserRole},
        lead::{Lead, LeadOutcome, LeadRating, LostDetails, NotTodayReason, PurchaseTimeline},
    },
};

const JWT_SECRET: &str = "segredo-de-teste";
const CRON_SECRET: &str = "cron-de-teste";

struct TestApp {
    router: Router,
    store: Arc<InMemoryLeadStore>,
    org: Uuid,
    rep_id: Uuid,
    category_id: Uuid,
    admin: String,
    rep: String,
}

fn token(user_id: Uuid, org: Uuid, role: UserRole) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        org,
        role,
        exp: (now + Duration::hours(1)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_ref())).unwrap()
}

async fn setup() -> TestApp {
    let store = Arc::new(InMemoryLeadStore::new());
    let org = Uuid::new_v4();
    let rep_id = Uuid::new_v4();
    let category = store.seed_category(org, "Refrigerators", 1).await;

    let state = AppState::with_store(store.clone(), JWT_SECRET.into(), CRON_SECRET.into());

    TestApp {
        router: lead_tracker::app(state),
        store,
        org,
        rep_id,
        category_id: category.id,
        admin: token(Uuid::new_v4(), org, UserRole::Admin),
        rep: token(rep_id, org, UserRole::SalesRep),
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
    language: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
    }
    if let Some(language) = language {
        builder = builder.header(header::ACCEPT_LANGUAGE, language);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

fn win_payload(app: &TestApp, invoice_no: &str) -> Value {
    json!({
        "customerName": "Ravi Kumar",
        "customerPhone": "9876543210",
        "categoryId": app.category_id.to_string(),
        "status": "win",
        "invoiceNo": invoice_no,
        "salePrice": 1000
    })
}

fn lost_payload(app: &TestApp) -> Value {
    json!({
        "customerName": "Ravi Kumar",
        "customerPhone": "9876543210",
        "categoryId": app.category_id.to_string(),
        "status": "lost",
        "dealSize": "150000",
        "modelName": "Frost Free 350L",
        "purchaseTimeline": "7_days",
        "notTodayReason": "price_high",
        "leadRating": 4
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn protected_routes_reject_missing_or_forged_tokens() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/api/leads", None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "invalid_token");

    let (status, _) = send(&app, Method::GET, "/api/leads", Some("nao-e-um-jwt"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn win_lead_is_created_pending_and_invoice_stays_unique() {
    let app = setup().await;

    let (status, body) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV001")), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "win");
    assert_eq!(body["reviewStatus"], "pending");
    assert_eq!(body["salesRepId"], app.rep_id.to_string());
    assert_eq!(body["score"], 0);
    assert_eq!(body["scoreCategory"], "COLD");
    assert!(body["dealSize"].is_null());

    let (status, body) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV001")), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_invoice");
    assert_eq!(body["details"]["invoiceNo"], "INV001");
}

#[tokio::test]
async fn lost_lead_gets_model_and_score() {
    let app = setup().await;

    let (status, body) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(lost_payload(&app)), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "lost");
    assert_eq!(body["purchaseTimeline"], "7_days");
    assert_eq!(body["notTodayReason"], "price_high");
    assert!(body["modelId"].is_string());
    assert!(body["invoiceNo"].is_null());
    assert!(body["score"].as_u64().unwrap() > 0);
    assert_eq!(app.store.model_count(app.org).await, 1);
}

#[tokio::test]
async fn validation_messages_follow_accept_language() {
    let app = setup().await;
    let mut payload = win_payload(&app, "INV002");
    payload["customerPhone"] = json!("12345");

    let (status, body) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(payload.clone()), Some("pt-BR,pt;q=0.9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_phone");
    assert_eq!(body["error"], "O telefone deve ter exatamente 10 dígitos");

    let (_, body) = send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(payload), Some("fr")).await;
    assert_eq!(body["error"], "Phone number must have exactly 10 digits");
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let app = setup().await;
    let mut payload = win_payload(&app, "INV003");
    payload["categoryId"] = json!(Uuid::new_v4().to_string());

    let (status, body) = send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(payload), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "category_not_found");
}

#[tokio::test]
async fn incentive_requires_admin_and_a_reviewed_lead() {
    let app = setup().await;
    let (_, created) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV010")), None).await;
    let uri = format!("/api/admin/leads/{}", created["id"].as_str().unwrap());
    let grant = json!({ "has_incentive": true, "incentive_amount": 500 });

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&app.rep), Some(grant.clone()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&app.admin), Some(grant.clone()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "incentive_requires_review");

    let review = json!({ "invoiceNo": "INV010", "reviewStatus": "reviewed" });
    let (status, body) =
        send(&app, Method::PUT, "/api/leads/review-status", Some(&app.rep), Some(review), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviewStatus"], "reviewed");
    assert_eq!(body["reviewedBy"], app.rep_id.to_string());

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&app.admin), Some(grant), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasIncentive"], true);
    assert_eq!(body["incentiveAmount"], 500.0);

    let (status, body) = send(&app, Method::GET, "/api/leads/my-incentives", Some(&app.rep), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn review_status_rejects_pending_and_unknown_invoices() {
    let app = setup().await;

    let pending = json!({ "invoiceNo": "INV404", "reviewStatus": "pending" });
    let (status, body) =
        send(&app, Method::PUT, "/api/leads/review-status", Some(&app.rep), Some(pending), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_review_status");

    let missing = json!({ "invoiceNo": "INV404", "reviewStatus": "yet_to_review" });
    let (status, body) =
        send(&app, Method::PUT, "/api/leads/review-status", Some(&app.rep), Some(missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "lead_not_found");
}

#[tokio::test]
async fn list_filters_and_rep_visibility() {
    let app = setup().await;
    send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV020")), None).await;
    send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(lost_payload(&app)), None).await;
    send(&app, Method::POST, "/api/leads", Some(&app.admin), Some(win_payload(&app, "INV021")), None).await;

    let (status, body) = send(&app, Method::GET, "/api/leads", Some(&app.rep), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/leads?status=win", Some(&app.admin), None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::GET, "/api/leads?status=maybe", Some(&app.admin), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_status");
}

#[tokio::test]
async fn bulk_delete_is_all_or_nothing() {
    let app = setup().await;
    let (_, a) = send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV030")), None).await;
    let (_, b) = send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(lost_payload(&app)), None).await;
    let ids = vec![a["id"].clone(), b["id"].clone()];

    let mut with_stranger = ids.clone();
    with_stranger.push(json!(Uuid::new_v4().to_string()));
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/leads/bulk-delete",
        Some(&app.admin),
        Some(json!({ "leadIds": with_stranger })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/leads", Some(&app.admin), None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/leads/bulk-delete",
        Some(&app.admin),
        Some(json!({ "leadIds": ids })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/leads/bulk-delete",
        Some(&app.admin),
        Some(json!({ "leadIds": [] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_fields");
}

#[tokio::test]
async fn single_delete_returns_no_content() {
    let app = setup().await;
    let (_, created) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV040")), None).await;
    let uri = format!("/api/admin/leads/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&app.rep), None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&app.admin), None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&app.admin), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_are_admin_managed_and_ordered() {
    let app = setup().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(&app.rep),
        Some(json!({ "name": "Televisions" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(&app.admin),
        Some(json!({ "name": "  Televisions " })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Televisions");
    assert_eq!(created["displayOrder"], 2);

    let reorder = json!({
        "categoryOrders": [
            { "id": created["id"], "display_order": 1 },
            { "id": app.category_id.to_string(), "displayOrder": 2 }
        ]
    });
    let (status, body) =
        send(&app, Method::PUT, "/api/categories/reorder", Some(&app.admin), Some(reorder), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Televisions");

    let (status, body) = send(&app, Method::GET, "/api/categories", Some(&app.rep), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["name"], "Refrigerators");
}

#[tokio::test]
async fn customer_history_summarizes_by_phone() {
    let app = setup().await;
    send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(win_payload(&app, "INV050")), None).await;
    send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(lost_payload(&app)), None).await;

    let (status, body) = send(&app, Method::GET, "/api/customers/9876543210", Some(&app.admin), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer"]["leadCount"], 2);
    assert_eq!(body["customer"]["winCount"], 1);
    assert_eq!(body["customer"]["lostCount"], 1);
    assert_eq!(body["leads"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::GET, "/api/customers/1111111111", Some(&app.admin), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "customer_not_found");
}

#[tokio::test]
async fn whatsapp_mark_keeps_first_timestamp() {
    let app = setup().await;
    let (_, created) =
        send(&app, Method::POST, "/api/leads", Some(&app.rep), Some(lost_payload(&app)), None).await;
    let uri = format!("/api/leads/{}/whatsapp-sent", created["id"].as_str().unwrap());

    let (status, first) = send(&app, Method::POST, &uri, Some(&app.rep), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["whatsappSent"], true);

    let (_, second) = send(&app, Method::POST, &uri, Some(&app.rep), None, None).await;
    assert_eq!(second["whatsappSentAt"], first["whatsappSentAt"]);
}

#[tokio::test]
async fn cron_sweep_needs_the_shared_secret() {
    let app = setup().await;
    let now = Utc::now();
    let stale = Lead {
        id: Uuid::new_v4(),
        organization_id: app.org,
        sales_rep_id: app.rep_id,
        customer_name: "Ravi Kumar".into(),
        customer_phone: "9876543210".into(),
        category_id: app.category_id,
        outcome: LeadOutcome::Lost(LostDetails {
            deal_size: Decimal::new(50_000, 0),
            model_id: Uuid::new_v4(),
            purchase_timeline: PurchaseTimeline::SevenDays,
            not_today_reason: Some(NotTodayReason::PriceHigh),
            lead_rating: LeadRating::new(3).unwrap(),
            auto_expired_at: None,
        }),
        whatsapp_sent: false,
        whatsapp_sent_at: None,
        created_at: now - Duration::days(45),
        updated_at: now - Duration::days(45),
    };
    app.store.put_lead(stale.clone()).await;

    let uri = "/api/cron/auto-expire-leads";
    let (status, _) = send(&app, Method::GET, uri, None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, uri, Some(&app.admin), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, uri, Some(CRON_SECRET), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiredCount"], 1);
    assert_eq!(body["leads"][0]["id"], stale.id.to_string());
    assert_eq!(body["leads"][0]["notTodayReason"], "other");
    assert!(body["leads"][0]["otherReason"].as_str().unwrap().starts_with("Auto-expired"));

    // A segunda execução não encontra mais nada.
    let (status, body) = send(&app, Method::POST, uri, Some(CRON_SECRET), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiredCount"], 0);
}

use super::*;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{MovementId, MovementKind};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Default)]
struct StubInventory {
    products: Vec<Product>,
    movement_attempts: Vec<(NewMovement, usize)>,
    accepted_movements: i64,
}

#[derive(Clone, Default)]
struct ServerState {
    inner: Arc<Mutex<StubInventory>>,
}

type Rejection = (StatusCode, Json<ApiErrorBody>);

fn reject(status: StatusCode, detail: &str) -> Rejection {
    (status, Json(ApiErrorBody::new(detail)))
}

async fn handle_list_products(State(state): State<ServerState>) -> Json<Vec<Product>> {
    Json(state.inner.lock().await.products.clone())
}

async fn handle_create_product(
    State(state): State<ServerState>,
    Json(payload): Json<NewProduct>,
) -> Result<Json<Product>, Rejection> {
    let mut inner = state.inner.lock().await;
    if inner.products.iter().any(|p| p.sku == payload.sku) {
        return Err(reject(StatusCode::BAD_REQUEST, "SKU already exists"));
    }
    let product = Product {
        id: ProductId(inner.products.len() as i64 + 1),
        sku: payload.sku,
        name: payload.name,
        category: payload.category,
        unit_cost: payload.unit_cost,
        selling_price: payload.selling_price,
        min_stock: payload.min_stock,
        reorder_point: payload.reorder_point,
        lead_time_days: payload.lead_time_days,
    };
    inner.products.push(product.clone());
    Ok(Json(product))
}

async fn handle_get_product(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, Rejection> {
    let inner = state.inner.lock().await;
    inner
        .products
        .iter()
        .find(|p| p.id == ProductId(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Product not found"))
}

async fn handle_create_movement(
    State(state): State<ServerState>,
    Query(movement): Query<NewMovement>,
    body: Bytes,
) -> Result<Json<MovementReceipt>, (StatusCode, Json<Value>)> {
    let mut inner = state.inner.lock().await;
    inner.movement_attempts.push((movement, body.len()));
    if movement.quantity <= 0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["query", "quantity"], "msg": "must be positive" }] })),
        ));
    }
    if !inner.products.iter().any(|p| p.id == movement.product_id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Product not found" })),
        ));
    }
    inner.accepted_movements += 1;
    Ok(Json(MovementReceipt {
        id: MovementId(inner.accepted_movements),
        status: "ok".to_string(),
    }))
}

async fn handle_forecast(Query(query): Query<ForecastQuery>) -> Json<Forecast> {
    let horizon = query.horizon as usize;
    Json(Forecast {
        product_id: query.product_id,
        horizon: query.horizon,
        moving_average: vec![5.0; horizon],
        linear_regression: (0..horizon).map(|i| 4.0 + i as f64 * 0.5).collect(),
    })
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn serve(app: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_inventory_server() -> anyhow::Result<(String, ServerState)> {
    let state = ServerState::default();
    let app = Router::new()
        .route(
            "/products/",
            get(handle_list_products).post(handle_create_product),
        )
        .route("/products/:id", get(handle_get_product))
        .route("/movements/", axum::routing::post(handle_create_movement))
        .route("/ml/forecast", get(handle_forecast))
        .route("/health", get(handle_health))
        .with_state(state.clone());
    Ok((serve(app).await?, state))
}

async fn seeded_client() -> (HttpInventoryClient, ServerState) {
    let (server_url, state) = spawn_inventory_server().await.expect("spawn server");
    let client = HttpInventoryClient::new(&server_url).expect("client");
    client
        .create_product(&NewProduct::new("SKU-1", "Test Product"))
        .await
        .expect("seed product");
    (client, state)
}

#[tokio::test]
async fn create_product_returns_server_assigned_product() {
    let (server_url, _state) = spawn_inventory_server().await.expect("spawn server");
    let client = HttpInventoryClient::new(&server_url).expect("client");

    let mut payload = NewProduct::new("A1", "Widget");
    payload.category = Some("hardware".to_string());
    let product = client.create_product(&payload).await.expect("create");

    assert_eq!(product.id, ProductId(1));
    assert_eq!(product.sku, "A1");
    assert_eq!(product.name, "Widget");
    assert_eq!(product.category.as_deref(), Some("hardware"));
}

#[tokio::test]
async fn list_products_keeps_server_order() {
    let (client, _state) = seeded_client().await;
    client
        .create_product(&NewProduct::new("SKU-2", "Second"))
        .await
        .expect("create second");

    let products = client.list_products().await.expect("list");
    let skus: Vec<&str> = products.iter().map(|p| p.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-1", "SKU-2"]);
}

#[tokio::test]
async fn duplicate_sku_is_rejected_with_backend_detail() {
    let (client, _state) = seeded_client().await;

    let err = client
        .create_product(&NewProduct::new("SKU-1", "Again"))
        .await
        .expect_err("duplicate must fail");

    match err {
        ClientError::Rejected { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "SKU already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_movement_sends_query_parameters_without_body() {
    let (client, state) = seeded_client().await;

    let receipt = client
        .create_movement(NewMovement {
            product_id: ProductId(1),
            kind: MovementKind::Out,
            quantity: 3,
        })
        .await
        .expect("movement");

    assert_eq!(receipt.id, MovementId(1));
    assert_eq!(receipt.status, "ok");

    let inner = state.inner.lock().await;
    let (movement, body_len) = inner.movement_attempts[0];
    assert_eq!(movement.product_id, ProductId(1));
    assert_eq!(movement.kind, MovementKind::Out);
    assert_eq!(movement.quantity, 3);
    assert_eq!(body_len, 0);
}

#[tokio::test]
async fn movement_for_unknown_product_is_rejected() {
    let (client, _state) = seeded_client().await;

    let err = client
        .create_movement(NewMovement::quick_sale(ProductId(42)))
        .await
        .expect_err("unknown product");

    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Product not found"), "{err}");
}

#[tokio::test]
async fn non_positive_quantity_is_left_for_the_backend_to_reject() {
    let (client, state) = seeded_client().await;

    let err = client
        .create_movement(NewMovement {
            product_id: ProductId(1),
            kind: MovementKind::In,
            quantity: 0,
        })
        .await
        .expect_err("zero quantity");

    assert_eq!(err.status(), Some(422));
    let inner = state.inner.lock().await;
    assert_eq!(inner.movement_attempts.len(), 1);
    assert_eq!(inner.movement_attempts[0].0.quantity, 0);
}

#[tokio::test]
async fn get_product_reports_missing_product() {
    let (client, _state) = seeded_client().await;

    let found = client.get_product(ProductId(1)).await.expect("get");
    assert_eq!(found.sku, "SKU-1");

    let err = client
        .get_product(ProductId(9))
        .await
        .expect_err("missing");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn forecast_and_health_decode() {
    let (client, _state) = seeded_client().await;

    let forecast = client
        .forecast(ForecastQuery {
            product_id: ProductId(1),
            horizon: 3,
        })
        .await
        .expect("forecast");
    assert_eq!(forecast.product_id, ProductId(1));
    assert_eq!(forecast.moving_average.len(), 3);
    assert_eq!(forecast.linear_regression, vec![4.0, 4.5, 5.0]);

    let health = client.health().await.expect("health");
    assert!(health.is_ok());
}

#[tokio::test]
async fn malformed_product_list_is_a_decode_error() {
    let app = Router::new().route(
        "/products/",
        get(|| async { Json(json!({ "items": [] })) }),
    );
    let server_url = serve(app).await.expect("serve");
    let client = HttpInventoryClient::new(&server_url).expect("client");

    let err = client.list_products().await.expect_err("malformed");
    assert!(
        matches!(err, ClientError::Decode { endpoint: "GET /products/", .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn plain_text_error_body_is_kept_as_detail() {
    let app = Router::new().route(
        "/health",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "backend starting\n") }),
    );
    let server_url = serve(app).await.expect("serve");
    let client = HttpInventoryClient::new(&server_url).expect("client");

    match client.health().await.expect_err("unavailable") {
        ClientError::Rejected { status, detail } => {
            assert_eq!(status, 503);
            assert_eq!(detail, "backend starting");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpInventoryClient::new(&format!("http://{addr}")).expect("client");
    let err = client.list_products().await.expect_err("nothing listening");
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[test]
fn base_url_trailing_slashes_are_stripped() {
    assert_eq!(
        normalize_base_url("http://localhost:8000/").expect("valid"),
        "http://localhost:8000"
    );
    assert_eq!(
        normalize_base_url("  https://inventory.example/api//  ").expect("valid"),
        "https://inventory.example/api"
    );
}

#[test]
fn base_url_must_be_absolute_http() {
    for raw in ["localhost:8000", "ftp://host/", "", "http://host/?x=1"] {
        let err = normalize_base_url(raw).expect_err(raw);
        assert!(
            matches!(err, ClientError::InvalidBaseUrl { .. }),
            "{raw}: {err:?}"
        );
    }
}

#[test]
fn endpoint_appends_path_to_prefixed_base() {
    let client = HttpInventoryClient::new("http://host:9000/api/").expect("client");
    assert_eq!(client.base_url(), "http://host:9000/api");
    assert_eq!(client.endpoint("/products/"), "http://host:9000/api/products/");
}

pub mod domain;
pub mod handlers;
pub mod shared;
pub mod system;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use axum::{
        routing::{get, post, put},
        Router,
    };
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    system::tracing::initialize()?;

    // Connect and bootstrap the schema (path comes from config.toml)
    shared::data::db::initialize_database()
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // GASTO (composed expense record)
        // ========================================
        .route("/api/gasto", post(handlers::a002_gasto::create))
        .route(
            "/api/gasto/multiple",
            post(handlers::a002_gasto::create_multiple),
        )
        .route("/api/gasto/list", get(handlers::a002_gasto::list))
        .route(
            "/api/gasto/:id",
            get(handlers::a002_gasto::get_by_id)
                .put(handlers::a002_gasto::update)
                .delete(handlers::a002_gasto::delete),
        )
        // ========================================
        // FORMULARIO (grouping headers)
        // ========================================
        .route("/api/formulario", get(handlers::a001_formulario::list_all))
        .route(
            "/api/formulario/:id",
            get(handlers::a001_formulario::get_detalle),
        )
        // ========================================
        // ORDEN (advertising orders + allocations)
        // ========================================
        .route(
            "/api/orden",
            get(handlers::a003_orden::list_all).post(handlers::a003_orden::upsert),
        )
        .route("/api/orden/:id", get(handlers::a003_orden::get_by_id))
        .route(
            "/api/orden/:id/items",
            put(handlers::a003_orden::save_items),
        )
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], 3000).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port 3000 is already in use. Please ensure no other process is using this port."
                );
            } else {
                tracing::error!("Failed to bind to port 3000. Error: {}", e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}

use axum::{
    Router, error_handling::HandleErrorLayer, extract::Request, http::StatusCode,
    response::IntoResponse, routing::get,
};
use flash_limit::AdmissionConfig;
use flash_limit::AdmissionController;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::BoxError;
use tower::ServiceBuilder;
use tower_flash::{FlashError, ManagedAdmissionLayer};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 1. Parameters as the deployment would supply them
    let params = HashMap::from([
        ("maxPermission", "100"),
        ("blockRatio", "0.4"),
        ("startTime", "2024-11-11 00:00:00"),
    ]);
    let config = AdmissionConfig::from_params(params)?;
    let gate = Arc::new(AdmissionController::new(config));

    // 2. Setup Managed Layer
    let managed_layer =
        ManagedAdmissionLayer::<_, Request>::new(gate, Duration::from_millis(500));

    // 3. Build the Router
    let app = Router::new()
        .route("/product", get(|| async { "Welcome to the flash sale!" }))
        .layer(
            ServiceBuilder::new()
                // 1. The outermost layer: catches BoxError and returns Response
                .layer(HandleErrorLayer::new(handle_flash_error))
                // 2. The middle layer: introduces BoxError
                .layer(managed_layer)
                // 3. Converts the Route's Infallible to BoxError
                // so that ManagedAdmissionLayer is happy wrapping it.
                .map_err(BoxError::from),
        );

    // 4. Serve
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    println!("📡 Listening on http://127.0.0.1:3000/product");

    axum::serve(listener, app).await?;
    Ok(())
}

/// The signature must match BoxError -> IntoResponse
async fn handle_flash_error(err: BoxError) -> impl IntoResponse {
    if let Some(flash_err) = err.downcast_ref::<FlashError>() {
        flash_err.clone().into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Service Error").into_response()
    }
}

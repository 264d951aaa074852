//! SafeChatter service: binary entrypoint.
//! Boots the Axum HTTP server with the message classifier and verdict chain wired in.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    safechatter::logging::init_tracing();

    let router = safechatter::app().await?;
    Ok(router.into())
}

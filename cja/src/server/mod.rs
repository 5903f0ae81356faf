use color_eyre::eyre::WrapErr;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;

pub mod cookies;
pub mod session;

pub mod trace;

/// Wraps the app routes with request tracing and cookie management.
pub fn layers(routes: axum::Router) -> axum::Router {
    let tracer = trace::Tracer;
    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tracer)
        .on_response(tracer);

    routes.layer(trace_layer).layer(CookieManagerLayer::new())
}

pub async fn run_server(routes: axum::Router) -> color_eyre::Result<()> {
    let app = layers(routes);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let port: u16 = port.parse().wrap_err("PORT is not a valid port number")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Starting server on port {}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err("Failed to open port")?;

    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .wrap_err("Failed to run server")
}

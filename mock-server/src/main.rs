use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mock_server::tls::SelfSigned;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    // TLS=1 serves https with a fresh self-signed certificate, printed to
    // stdout for clients to trust.
    if std::env::var("TLS").is_ok_and(|v| v == "1") {
        let tls = SelfSigned::generate(&["127.0.0.1", "localhost"])?;
        print!("{}", tls.cert_pem);
        tracing::info!(%addr, "echo server listening (tls)");
        return mock_server::tls::run(listener, tls).await;
    }

    tracing::info!(%addr, "echo server listening");
    mock_server::run(listener).await
}

use mock_server::Scenario;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let scenario = match std::env::var("MOCK_API_KEY") {
        Ok(key) if !key.is_empty() => Scenario::RequireKey(key),
        _ => Scenario::Ok,
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, key_required = matches!(scenario, Scenario::RequireKey(_)), "mock news API listening");
    mock_server::run_with(listener, scenario).await
}

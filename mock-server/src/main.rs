use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let defaults = MockConfig::default();
    let config = MockConfig {
        api_key: std::env::var("SHLINK_API_KEY").unwrap_or(defaults.api_key),
        read_only_api_key: std::env::var("SHLINK_READ_ONLY_API_KEY").ok(),
        public_url: format!("http://{addr}"),
        ..defaults
    };

    let listener = TcpListener::bind(&addr).await?;
    mock_server::run_with_config(listener, config).await
}

use mock_push_gateway::api;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("mock_push_gateway=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        setup_tracing();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read test listener address");

        tokio::spawn(async move {
            axum::serve(listener, api::app_router().into_make_service()).await.expect("Test server crashed");
        });

        Self { server_url: format!("http://{addr}"), client: reqwest::Client::new() }
    }

    pub fn send_url(&self) -> String {
        format!("{}/gcm/send", self.server_url)
    }
}

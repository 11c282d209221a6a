/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl ServerConfig {
    pub fn load() -> Self {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Self { bind_address }
    }
}

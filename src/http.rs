//! Shared HTTP client factory.
//!
//! Both remote services go through the client built here so the user agent
//! stays consistent. No request timeout is set: an issued call only ends
//! early when its screen is torn down.

use reqwest::Client;

const USER_AGENT: &str = concat!("eatmate/", env!("CARGO_PKG_VERSION"));

/// Create a new HTTP client.
pub fn create_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn create_client_returns_valid_client() {
        let client = create_client();
        assert!(std::mem::size_of_val(&client) > 0);
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("eatmate/"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_is_not_cut_off() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let request = create_client().get(format!("http://{}/slow", addr)).send();
        tokio::select! {
            result = request => panic!("request ended without a response: {:?}", result.map(|r| r.status())),
            _ = tokio::time::sleep(std::time::Duration::from_secs(300)) => {}
        }
    }
}

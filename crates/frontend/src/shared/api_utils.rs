//! Backend address discovery.

/// Port the backend listens on by default.
pub const BACKEND_PORT: u16 = 3000;

/// Base URL of the backend, derived from the page location.
///
/// A page served on a default port (behind a reverse proxy) reuses its
/// origin; any other page talks to `BACKEND_PORT` on the same host.
pub fn api_base() -> String {
    let Some(window) = web_sys::window() else {
        return String::new();
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = location.port().unwrap_or_default();
    base_for(&protocol, &hostname, &port)
}

fn base_for(protocol: &str, hostname: &str, port: &str) -> String {
    if port.is_empty() {
        format!("{}//{}", protocol, hostname)
    } else {
        format!("{}//{}:{}", protocol, hostname, BACKEND_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_for() {
        assert_eq!(base_for("http:", "localhost", "8080"), "http://localhost:3000");
        assert_eq!(base_for("http:", "localhost", "3000"), "http://localhost:3000");
        assert_eq!(base_for("https:", "shop.example", ""), "https://shop.example");
    }
}

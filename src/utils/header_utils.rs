use axum::extract::Request;
use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract API key from HTTP headers
///
/// Supports both X-API-Key header and Authorization: Bearer header.
/// X-API-Key takes precedence if both are present.
///
/// # Examples
///
/// ```
/// use axum::http::HeaderMap;
/// use tts_reader_server::utils::header_utils::extract_api_key;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-api-key", "my-secret-key".parse().unwrap());
/// assert_eq!(extract_api_key(&headers), Some("my-secret-key".to_string()));
/// ```
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Try X-API-Key header first
    if let Some(key) = headers.get("x-api-key") {
        if let Ok(key_str) = key.to_str() {
            return Some(key_str.to_string());
        }
    }

    // Try Authorization: Bearer header
    if let Some(auth) = headers.get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(stripped) = auth_str.strip_prefix("Bearer ") {
                return Some(stripped.to_string());
            }
        }
    }

    None
}

/// Extract the caller's IP from proxy headers, checking `X-Forwarded-For`
/// (first hop) then `X-Real-IP`. Returns `None` if neither header carries a
/// parseable address.
fn extract_client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first) = forwarded_str.split(',').next() {
                if let Ok(ip) = first.trim().parse() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.trim().parse() {
                return Some(ip);
            }
        }
    }

    None
}

/// Resolves the caller's IP for per-IP rate limiting: proxy headers first,
/// then the socket address axum records via `ConnectInfo` when the server is
/// bound with `into_make_service_with_connect_info`.
pub fn extract_client_ip(req: &Request) -> Result<IpAddr, String> {
    if let Some(ip) = extract_client_ip_from_headers(req.headers()) {
        return Ok(ip);
    }
    if let Some(connect_info) = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
    {
        return Ok(connect_info.0.ip());
    }
    Err("no X-Forwarded-For/X-Real-IP header and no ConnectInfo available".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key_x_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "test-key".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("test-key".to_string()));
    }

    #[test]
    fn test_extract_api_key_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test-token".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("test-token".to_string()));
    }

    #[test]
    fn test_extract_api_key_prefers_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "x-key".parse().unwrap());
        headers.insert("authorization", "Bearer bearer-key".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("x-key".to_string()));
    }

    #[test]
    fn test_extract_api_key_no_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_extract_api_key_invalid_bearer_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_extract_client_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.1, 10.0.0.1".parse().unwrap());
        assert_eq!(
            extract_client_ip_from_headers(&headers),
            Some("203.0.113.1".parse().unwrap())
        );
    }

    #[test]
    fn test_extract_client_ip_from_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.7".parse().unwrap());
        assert_eq!(
            extract_client_ip_from_headers(&headers),
            Some("198.51.100.7".parse().unwrap())
        );
    }

    #[test]
    fn test_extract_client_ip_missing_headers_returns_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip_from_headers(&headers), None);
    }
}

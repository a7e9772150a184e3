//! Client identifier extraction.

/// Identifier used when no address header is present.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Picks the rate-limit identifier for a request.
///
/// Uses the first entry of a forwarded-for list, then the real-ip header,
/// then `"unknown"`. Header values are trusted as sent.
pub fn identifier_from_request_headers(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    let forwarded = forwarded_for
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = real_ip.map(str::trim).filter(|ip| !ip.is_empty());

    forwarded
        .or(real_ip)
        .unwrap_or(UNKNOWN_IDENTIFIER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_forwarded_for() {
        let id = identifier_from_request_headers(Some("203.0.113.7"), Some("10.0.0.1"));
        assert_eq!(id, "203.0.113.7");
    }

    #[test]
    fn test_takes_first_forwarded_hop() {
        let id = identifier_from_request_headers(Some("203.0.113.7, 70.41.3.18, 150.172.238.178"), None);
        assert_eq!(id, "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_real_ip() {
        assert_eq!(identifier_from_request_headers(None, Some("10.0.0.1")), "10.0.0.1");
        assert_eq!(identifier_from_request_headers(Some(""), Some("10.0.0.1")), "10.0.0.1");
        assert_eq!(identifier_from_request_headers(Some(",1.1.1.1"), Some("10.0.0.1")), "10.0.0.1");
    }

    #[test]
    fn test_unknown_when_no_headers() {
        assert_eq!(identifier_from_request_headers(None, None), "unknown");
        assert_eq!(identifier_from_request_headers(Some(""), Some("")), "unknown");
    }

    #[test]
    fn test_value_is_not_validated() {
        let id = identifier_from_request_headers(Some("not-an-ip"), None);
        assert_eq!(id, "not-an-ip");
    }
}

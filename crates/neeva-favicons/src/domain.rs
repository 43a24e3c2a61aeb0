//! Registered domain extraction

use url::{Host, Url};

use crate::cache::sha256_hex;

/// Second-level labels used under two-letter country codes (`co.uk`,
/// `com.au`).
const COUNTRY_SECOND_LEVEL: &[&str] = &["ac", "co", "com", "edu", "gov", "ne", "net", "or", "org"];

/// Maps a URL to the domain favicons are shared across.
pub trait DomainProvider: Send + Sync {
    fn registered_domain(&self, url: &Url) -> Option<String>;
}

/// Keeps the last two labels of a host, or three under a country-code
/// second level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixDomainProvider;

impl DomainProvider for SuffixDomainProvider {
    fn registered_domain(&self, url: &Url) -> Option<String> {
        let host = match url.host()? {
            Host::Domain(domain) => domain.trim_end_matches('.').to_lowercase(),
            Host::Ipv4(ip) => return Some(ip.to_string()),
            Host::Ipv6(ip) => return Some(ip.to_string()),
        };

        let parts: Vec<&str> = host.split('.').filter(|p| !p.is_empty()).collect();
        let len = parts.len();
        if len < 2 {
            return (len == 1).then(|| parts[0].to_string());
        }

        let keep = if len >= 3
            && parts[len - 1].len() == 2
            && COUNTRY_SECOND_LEVEL.contains(&parts[len - 2])
        {
            3
        } else {
            2
        };
        Some(parts[len - keep..].join("."))
    }
}

/// Hex SHA-256 of a registered domain.
pub fn domain_hash(domain: &str) -> String {
    sha256_hex(domain.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(url: &str) -> Option<String> {
        SuffixDomainProvider.registered_domain(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_registered_domain() {
        assert_eq!(domain("https://www.example.com/page").as_deref(), Some("example.com"));
        assert_eq!(domain("https://news.bbc.co.uk/").as_deref(), Some("bbc.co.uk"));
        assert_eq!(domain("https://shop.example.com.au/").as_deref(), Some("example.com.au"));
        assert_eq!(domain("https://www.example.de/").as_deref(), Some("example.de"));
        assert_eq!(domain("http://localhost:8080/").as_deref(), Some("localhost"));
        assert_eq!(domain("http://127.0.0.1/").as_deref(), Some("127.0.0.1"));
        assert_eq!(domain("data:text/plain,hello"), None);
    }

    #[test]
    fn test_domain_hash() {
        let hash = domain_hash("example.com");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, domain_hash("example.com"));
        assert_ne!(hash, domain_hash("example.org"));
        assert_eq!(hash, sha256_hex(b"example.com"));
    }
}

//! WebFinger resolution for `acct:` resources.
//!
//! The server is authoritative for a single domain and points every
//! account on it at one OpenID Connect issuer. Whether the account
//! actually exists at the issuer is not checked.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ResolveError;

/// Link relation for an OpenID Connect issuer.
pub const OIDC_ISSUER_REL: &str = "http://openid.net/specs/connect/1.0/issuer";

/// Scheme accepted in resource URIs.
const ACCT_SCHEME: &str = "acct";

/// A link in a WebFinger response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link relation type
    pub rel: String,
    /// Target URL
    pub href: String,
}

/// A WebFinger JSON Resource Descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebFingerResponse {
    /// The resource that was queried, echoed back
    pub subject: String,
    /// Links describing the subject
    pub links: Vec<Link>,
}

/// Resolves `acct:` resources for one authoritative domain.
#[derive(Debug, Clone)]
pub struct WebFingerResolver {
    domain: String,
    issuer: String,
}

impl WebFingerResolver {
    /// Create a resolver for accounts `*@domain`, pointing at `issuer`.
    pub fn new(domain: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            issuer: issuer.into(),
        }
    }

    /// Resolve a resource URI such as `acct:alice@example.com`.
    pub fn resolve(&self, resource: &str) -> Result<WebFingerResponse, ResolveError> {
        resolve(resource, &self.domain, &self.issuer)
    }
}

/// Resolve `resource` against `domain`, returning a descriptor that links
/// to `issuer`.
///
/// The domain check is an exact, case-sensitive suffix match on
/// `@domain`.
///
/// # Errors
/// * [`ResolveError::InvalidFormat`] unless the resource is `acct:<account>`
/// * [`ResolveError::DomainNotAllowed`] if the account is not under `domain`
pub fn resolve(
    resource: &str,
    domain: &str,
    issuer: &str,
) -> Result<WebFingerResponse, ResolveError> {
    let account = match resource.split_once(':') {
        Some((ACCT_SCHEME, account)) => account,
        _ => return Err(ResolveError::InvalidFormat),
    };

    if !account.ends_with(&format!("@{}", domain)) {
        warn!(resource = %resource, domain = %domain, "resource does not match domain");
        return Err(ResolveError::DomainNotAllowed);
    }

    info!(resource = %resource, "resource allowed");

    Ok(WebFingerResponse {
        subject: resource.to_string(),
        links: vec![Link {
            rel: OIDC_ISSUER_REL.to_string(),
            href: issuer.to_string(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "example.com";
    const ISSUER: &str = "https://auth.example.com";

    #[test]
    fn test_resolve_allowed() {
        let resp = resolve("acct:alice@example.com", DOMAIN, ISSUER).unwrap();
        assert_eq!(resp.subject, "acct:alice@example.com");
        assert_eq!(
            resp.links,
            vec![Link {
                rel: OIDC_ISSUER_REL.to_string(),
                href: ISSUER.to_string(),
            }]
        );
    }

    #[test]
    fn test_resolve_other_domain() {
        assert_eq!(
            resolve("acct:alice@other.com", DOMAIN, ISSUER),
            Err(ResolveError::DomainNotAllowed)
        );
    }

    #[test]
    fn test_resolve_suffix_is_case_sensitive() {
        assert_eq!(
            resolve("acct:alice@EXAMPLE.COM", DOMAIN, ISSUER),
            Err(ResolveError::DomainNotAllowed)
        );
    }

    #[test]
    fn test_resolve_subdomain_lookalike() {
        assert_eq!(
            resolve("acct:alice@notexample.com", DOMAIN, ISSUER),
            Err(ResolveError::DomainNotAllowed)
        );
    }

    #[test]
    fn test_resolve_missing_scheme() {
        assert_eq!(
            resolve("alice@example.com", DOMAIN, ISSUER),
            Err(ResolveError::InvalidFormat)
        );
    }

    #[test]
    fn test_resolve_wrong_scheme() {
        assert_eq!(
            resolve("mailto:alice@example.com", DOMAIN, ISSUER),
            Err(ResolveError::InvalidFormat)
        );
    }

    #[test]
    fn test_resolve_splits_on_first_colon() {
        // The account part may itself contain ':'
        let resp = resolve("acct:a:b@example.com", DOMAIN, ISSUER).unwrap();
        assert_eq!(resp.subject, "acct:a:b@example.com");
    }

    #[test]
    fn test_resolver_uses_configured_values() {
        let resolver = WebFingerResolver::new("corp.test", "https://idp.corp.test");
        let resp = resolver.resolve("acct:bob@corp.test").unwrap();
        assert_eq!(resp.links[0].href, "https://idp.corp.test");
    }
}

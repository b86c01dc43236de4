//! # Digest challenge and authorization types
//!
//! Typed views of the WWW-Authenticate / Proxy-Authenticate challenges a
//! server sends in 401 and 407 responses, and of the Authorization /
//! Proxy-Authorization headers sent back.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthError, Result};
use crate::message::HeaderName;
use crate::parser::{self, quote};

/// Digest Algorithm (MD5, SHA-256, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// MD5 algorithm (RFC 2617)
    Md5,
    /// MD5 with session data (RFC 2617)
    Md5Sess,
    /// SHA-256 algorithm (RFC 7616)
    Sha256,
    /// SHA-256 with session data (RFC 7616)
    Sha256Sess,
    /// Other algorithms
    Other(String),
}

impl Algorithm {
    /// Whether HA1 is computed with the session variant
    pub fn is_session(&self) -> bool {
        matches!(self, Algorithm::Md5Sess | Algorithm::Sha256Sess)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Md5 => write!(f, "MD5"),
            Algorithm::Md5Sess => write!(f, "MD5-sess"),
            Algorithm::Sha256 => write!(f, "SHA-256"),
            Algorithm::Sha256Sess => write!(f, "SHA-256-sess"),
            Algorithm::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for Algorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "md5-sess" => Ok(Algorithm::Md5Sess),
            "sha-256" => Ok(Algorithm::Sha256),
            "sha-256-sess" => Ok(Algorithm::Sha256Sess),
            _ if !s.is_empty() => Ok(Algorithm::Other(s.to_string())),
            _ => Err(AuthError::general("Empty algorithm name")),
        }
    }
}

/// Quality of Protection (auth, auth-int)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qop {
    /// Authentication only
    Auth,
    /// Authentication with message integrity protection
    AuthInt,
    /// Other QOP values
    Other(String),
}

impl fmt::Display for Qop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qop::Auth => write!(f, "auth"),
            Qop::AuthInt => write!(f, "auth-int"),
            Qop::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for Qop {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auth" => Ok(Qop::Auth),
            "auth-int" => Ok(Qop::AuthInt),
            _ if !s.is_empty() => Ok(Qop::Other(s.to_string())),
            _ => Err(AuthError::general("Empty qop value")),
        }
    }
}

/// Which side of the exchange issued a challenge
///
/// A 401 comes from the user agent server (WWW-Authenticate, answered with
/// Authorization), a 407 from a proxy (Proxy-Authenticate, answered with
/// Proxy-Authorization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeKind {
    WwwAuthenticate,
    ProxyAuthenticate,
}

impl ChallengeKind {
    /// Classify a response status code
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(ChallengeKind::WwwAuthenticate),
            407 => Some(ChallengeKind::ProxyAuthenticate),
            _ => None,
        }
    }

    /// Header carrying the challenge in the response
    pub fn challenge_header(&self) -> HeaderName {
        match self {
            ChallengeKind::WwwAuthenticate => HeaderName::WwwAuthenticate,
            ChallengeKind::ProxyAuthenticate => HeaderName::ProxyAuthenticate,
        }
    }

    /// Header carrying the answer in the retried request
    pub fn authorization_header(&self) -> HeaderName {
        match self {
            ChallengeKind::WwwAuthenticate => HeaderName::Authorization,
            ChallengeKind::ProxyAuthenticate => HeaderName::ProxyAuthorization,
        }
    }
}

/// A parsed Digest challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub domain: Option<String>,
    pub opaque: Option<String>,
    pub stale: bool,
    pub algorithm: Option<Algorithm>,
    pub qop: Vec<Qop>,
    /// Parameters this crate does not interpret
    pub extra: BTreeMap<String, String>,
}

impl DigestChallenge {
    /// Create a challenge with only the mandatory fields
    pub fn new(realm: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            nonce: nonce.into(),
            domain: None,
            opaque: None,
            stale: false,
            algorithm: None,
            qop: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_qop(mut self, qop: Qop) -> Self {
        self.qop.push(qop);
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_opaque(mut self, opaque: impl Into<String>) -> Self {
        self.opaque = Some(opaque.into());
        self
    }

    pub fn with_stale(mut self, stale: bool) -> Self {
        self.stale = stale;
        self
    }

    /// Parse a WWW-Authenticate / Proxy-Authenticate header value
    ///
    /// Only the Digest scheme is accepted. A challenge without realm or nonce
    /// cannot be answered and is reported as [`AuthError::GeneralError`].
    pub fn parse(value: &str) -> Result<Self> {
        let (_, (scheme, params)) = parser::challenge(value.as_bytes())
            .map_err(|e| AuthError::general(format!("Malformed challenge '{}': {:?}", value, e)))?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(AuthError::general(format!("Unsupported authentication scheme '{}'", scheme)));
        }

        let mut params: BTreeMap<String, String> = params.into_iter().collect();

        let realm = params
            .remove("realm")
            .ok_or_else(|| AuthError::general("Missing realm in challenge"))?;
        let nonce = params
            .remove("nonce")
            .ok_or_else(|| AuthError::general("Missing nonce in challenge"))?;
        let algorithm = match params.remove("algorithm") {
            Some(a) => Some(a.parse()?),
            None => None,
        };
        let qop = match params.remove("qop") {
            Some(q) => q
                .split(',')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(Qop::from_str)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let stale = params
            .remove("stale")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(DigestChallenge {
            realm,
            nonce,
            domain: params.remove("domain"),
            opaque: params.remove("opaque"),
            stale,
            algorithm,
            qop,
            extra: params,
        })
    }
}

impl FromStr for DigestChallenge {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        DigestChallenge::parse(s)
    }
}

impl fmt::Display for DigestChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest realm={}, nonce={}", quote(&self.realm), quote(&self.nonce))?;
        if let Some(domain) = &self.domain {
            write!(f, ", domain={}", quote(domain))?;
        }
        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque={}", quote(opaque))?;
        }
        if self.stale {
            write!(f, ", stale=true")?;
        }
        if let Some(algorithm) = &self.algorithm {
            write!(f, ", algorithm={}", algorithm)?;
        }
        if !self.qop.is_empty() {
            let qop = self.qop.iter().map(|q| q.to_string()).collect::<Vec<_>>().join(",");
            write!(f, ", qop={}", quote(&qop))?;
        }
        for (name, value) in &self.extra {
            write!(f, ", {}={}", name, quote(value))?;
        }
        Ok(())
    }
}

/// Typed Authorization / Proxy-Authorization header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    pub response: String,
    pub algorithm: Option<Algorithm>,
    pub opaque: Option<String>,
    pub qop: Option<Qop>,
    pub cnonce: Option<String>,
    pub nonce_count: Option<String>,
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest username={}", quote(&self.username))?;
        write!(f, ", realm={}", quote(&self.realm))?;
        write!(f, ", nonce={}", quote(&self.nonce))?;
        write!(f, ", uri={}", quote(&self.uri))?;
        write!(f, ", response={}", quote(&self.response))?;
        if let Some(algorithm) = &self.algorithm {
            write!(f, ", algorithm={}", algorithm)?;
        }
        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque={}", quote(opaque))?;
        }
        if let Some(qop) = &self.qop {
            write!(f, ", qop={}", qop)?;
        }
        if let Some(cnonce) = &self.cnonce {
            write!(f, ", cnonce={}", quote(cnonce))?;
        }
        if let Some(nc) = &self.nonce_count {
            write!(f, ", nc={}", nc)?;
        }
        Ok(())
    }
}

//! Security agreement header values (RFC 3329, 3GPP TS 24.229 mediasec)
//!
//! Security-Client, Security-Server and Security-Verify headers all carry the
//! same value syntax: a mechanism name followed by `;`-separated parameters,
//! e.g. `sdes-srtp;mediasec` or `tls;q=0.2`.

use std::fmt;
use std::str::FromStr;

use crate::error::{AuthError, Result};
use crate::parser;

/// Parameter marking a mechanism as part of the media security handshake
pub const MEDIASEC_PARAM: &str = "mediasec";

/// One mechanism entry of a security agreement header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityMechanism {
    pub mechanism: String,
    /// Parameters in the order they appeared
    pub params: Vec<(String, Option<String>)>,
}

impl SecurityMechanism {
    pub fn new(mechanism: impl Into<String>) -> Self {
        Self {
            mechanism: mechanism.into(),
            params: Vec::new(),
        }
    }

    /// Mechanism entry flagged with the `mediasec` parameter
    pub fn mediasec(mechanism: impl Into<String>) -> Self {
        Self::new(mechanism).with_param(MEDIASEC_PARAM, None)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.params.push((name.into(), value.map(str::to_string)));
        self
    }

    /// Look up a parameter; `Some(None)` for a flag parameter
    pub fn param(&self, name: &str) -> Option<Option<&str>> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref())
    }

    /// Case-insensitive mechanism name comparison
    pub fn names(&self, mechanism: &str) -> bool {
        self.mechanism.eq_ignore_ascii_case(mechanism)
    }
}

impl fmt::Display for SecurityMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mechanism)?;
        for (name, value) in &self.params {
            match value {
                Some(v) if !v.is_empty() && v.bytes().all(parser::is_token_char) => write!(f, ";{}={}", name, v)?,
                Some(v) => write!(f, ";{}={}", name, parser::quote(v))?,
                None => write!(f, ";{}", name)?,
            }
        }
        Ok(())
    }
}

impl FromStr for SecurityMechanism {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        let (_, (mechanism, params)) = parser::security_mechanism(s.as_bytes())
            .map_err(|e| AuthError::general(format!("Malformed security mechanism '{}': {:?}", s, e)))?;
        Ok(SecurityMechanism { mechanism, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mediasec_entry() {
        let entry: SecurityMechanism = "sdes-srtp;mediasec".parse().unwrap();
        assert_eq!(entry.mechanism, "sdes-srtp");
        assert_eq!(entry.param(MEDIASEC_PARAM), Some(None));
        assert_eq!(entry.to_string(), "sdes-srtp;mediasec");
    }

    #[test]
    fn test_parse_params() {
        let entry: SecurityMechanism = "tls ; q=0.2; mediasec".parse().unwrap();
        assert_eq!(entry.param("q"), Some(Some("0.2")));
        assert_eq!(entry.param("MEDIASEC"), Some(None));
        assert_eq!(entry.param("d-alg"), None);
        assert!(entry.names("TLS"));
    }

    #[test]
    fn test_parse_empty() {
        assert!("".parse::<SecurityMechanism>().is_err());
        assert!(";mediasec".parse::<SecurityMechanism>().is_err());
        assert!("tls;q=".parse::<SecurityMechanism>().is_err());
    }

    #[test]
    fn test_quoted_param_round_trip() {
        let entry = SecurityMechanism::new("ipsec-3gpp").with_param("d-ver", Some("a;b \"c\""));
        assert_eq!(entry.to_string(), r#"ipsec-3gpp;d-ver="a;b \"c\"""#);
        assert_eq!(entry.to_string().parse::<SecurityMechanism>().unwrap(), entry);
    }
}

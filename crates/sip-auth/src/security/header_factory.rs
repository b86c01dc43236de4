//! Mediasec header construction for REGISTER requests
//!
//! Builds the Security-Client offer with its `Require`/`Proxy-Require`
//! companions, derives Security-Verify values from a registrar's
//! Security-Server list and checks that list for the configured mechanism.

use crate::message::{Header, HeaderName, Method, Request};
use crate::types::{SecurityMechanism, MEDIASEC_PARAM};

/// Stateless builder and validator for mediasec headers
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaderFactory;

impl SecurityHeaderFactory {
    pub fn new() -> Self {
        Self
    }

    /// Attach `Security-Client: <mechanism>;mediasec` together with
    /// `Require: mediasec` and `Proxy-Require: mediasec`
    ///
    /// Only REGISTER requests take part in the handshake; other requests are
    /// left untouched and `false` is returned. Headers already present are
    /// replaced rather than duplicated.
    pub fn add_security_client_headers(&self, request: &mut Request, mechanism: &str) -> bool {
        if request.method != Method::Register {
            return false;
        }

        request.remove_headers(&HeaderName::SecurityClient);
        request.push_header(Header::SecurityClient(self.create_security_client(mechanism)));

        if !Self::requires_mediasec(request, &HeaderName::Require) {
            request.push_header(Header::Require(MEDIASEC_PARAM.to_string()));
        }
        if !Self::requires_mediasec(request, &HeaderName::ProxyRequire) {
            request.push_header(Header::ProxyRequire(MEDIASEC_PARAM.to_string()));
        }
        true
    }

    fn requires_mediasec(request: &Request, name: &HeaderName) -> bool {
        request.headers(name).any(|h| match h {
            Header::Require(v) | Header::ProxyRequire(v) => v
                .split(',')
                .any(|tag| tag.trim().eq_ignore_ascii_case(MEDIASEC_PARAM)),
            _ => false,
        })
    }

    /// Security-Client value naming `mechanism`
    pub fn create_security_client(&self, mechanism: &str) -> SecurityMechanism {
        SecurityMechanism::mediasec(mechanism)
    }

    /// Security-Verify value echoing a server-advertised mechanism
    ///
    /// Only the mechanism name is carried over for now.
    pub fn create_security_verify(&self, server: &SecurityMechanism) -> SecurityMechanism {
        SecurityMechanism::new(server.mechanism.clone())
    }

    /// Whether any server-advertised header names `mechanism`
    pub fn does_supported_security_header_exist(
        &self,
        server_headers: &[SecurityMechanism],
        mechanism: &str,
    ) -> bool {
        server_headers.iter().any(|h| h.names(mechanism))
    }
}

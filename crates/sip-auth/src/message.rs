//! Minimal SIP message model
//!
//! The transport, transaction and dialog layers live in the protocol stack.
//! This module carries just enough of a request and a response for the stack
//! to hand messages through the [`TransactionFactory`](crate::TransactionFactory)
//! seam and for the authentication engine to inspect and repair them.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{AuthError, Result};
use crate::types::{Authorization, ChallengeKind, SecurityMechanism};

/// SIP request method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Register,
    Invite,
    Ack,
    Bye,
    Cancel,
    Options,
    Message,
    Subscribe,
    Notify,
    Publish,
    Info,
    Refer,
    Update,
    Prack,
    Other(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Register => "REGISTER",
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Options => "OPTIONS",
            Method::Message => "MESSAGE",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Publish => "PUBLISH",
            Method::Info => "INFO",
            Method::Refer => "REFER",
            Method::Update => "UPDATE",
            Method::Prack => "PRACK",
            Method::Other(s) => s.as_str(),
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Method {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "REGISTER" => Ok(Method::Register),
            "INVITE" => Ok(Method::Invite),
            "ACK" => Ok(Method::Ack),
            "BYE" => Ok(Method::Bye),
            "CANCEL" => Ok(Method::Cancel),
            "OPTIONS" => Ok(Method::Options),
            "MESSAGE" => Ok(Method::Message),
            "SUBSCRIBE" => Ok(Method::Subscribe),
            "NOTIFY" => Ok(Method::Notify),
            "PUBLISH" => Ok(Method::Publish),
            "INFO" => Ok(Method::Info),
            "REFER" => Ok(Method::Refer),
            "UPDATE" => Ok(Method::Update),
            "PRACK" => Ok(Method::Prack),
            _ if !s.is_empty() => Ok(Method::Other(s.to_string())),
            _ => Err(AuthError::general("Empty method name")),
        }
    }
}

/// Names of the headers this crate distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderName {
    Via,
    CallId,
    CSeq,
    WwwAuthenticate,
    ProxyAuthenticate,
    Authorization,
    ProxyAuthorization,
    SecurityClient,
    SecurityServer,
    SecurityVerify,
    Require,
    ProxyRequire,
    Other(String),
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeaderName::Via => "Via",
            HeaderName::CallId => "Call-ID",
            HeaderName::CSeq => "CSeq",
            HeaderName::WwwAuthenticate => "WWW-Authenticate",
            HeaderName::ProxyAuthenticate => "Proxy-Authenticate",
            HeaderName::Authorization => "Authorization",
            HeaderName::ProxyAuthorization => "Proxy-Authorization",
            HeaderName::SecurityClient => "Security-Client",
            HeaderName::SecurityServer => "Security-Server",
            HeaderName::SecurityVerify => "Security-Verify",
            HeaderName::Require => "Require",
            HeaderName::ProxyRequire => "Proxy-Require",
            HeaderName::Other(s) => s.as_str(),
        };
        write!(f, "{}", name)
    }
}

/// Top Via header; only the branch parameter matters here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Via {
    pub transport: String,
    pub sent_by: String,
    pub branch: Option<String>,
}

impl Via {
    pub fn new(transport: impl Into<String>, sent_by: impl Into<String>, branch: Option<&str>) -> Self {
        Self {
            transport: transport.into(),
            sent_by: sent_by.into(),
            branch: branch.map(str::to_string),
        }
    }
}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/2.0/{} {}", self.transport, self.sent_by)?;
        if let Some(branch) = &self.branch {
            write!(f, ";branch={}", branch)?;
        }
        Ok(())
    }
}

/// CSeq header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSeq {
    pub seq: u32,
    pub method: Method,
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seq, self.method)
    }
}

/// A SIP header
///
/// Challenge headers keep their raw value so that malformed challenges can be
/// reported when they are actually used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Via(Via),
    CallId(String),
    CSeq(CSeq),
    WwwAuthenticate(String),
    ProxyAuthenticate(String),
    Authorization(Authorization),
    ProxyAuthorization(Authorization),
    SecurityClient(SecurityMechanism),
    SecurityServer(SecurityMechanism),
    SecurityVerify(SecurityMechanism),
    Require(String),
    ProxyRequire(String),
    Other { name: String, value: String },
}

impl Header {
    pub fn name(&self) -> HeaderName {
        match self {
            Header::Via(_) => HeaderName::Via,
            Header::CallId(_) => HeaderName::CallId,
            Header::CSeq(_) => HeaderName::CSeq,
            Header::WwwAuthenticate(_) => HeaderName::WwwAuthenticate,
            Header::ProxyAuthenticate(_) => HeaderName::ProxyAuthenticate,
            Header::Authorization(_) => HeaderName::Authorization,
            Header::ProxyAuthorization(_) => HeaderName::ProxyAuthorization,
            Header::SecurityClient(_) => HeaderName::SecurityClient,
            Header::SecurityServer(_) => HeaderName::SecurityServer,
            Header::SecurityVerify(_) => HeaderName::SecurityVerify,
            Header::Require(_) => HeaderName::Require,
            Header::ProxyRequire(_) => HeaderName::ProxyRequire,
            Header::Other { name, .. } => HeaderName::Other(name.clone()),
        }
    }

    /// Build the authorization header answering a challenge of `kind`
    pub fn authorization_for(kind: ChallengeKind, value: Authorization) -> Self {
        match kind {
            ChallengeKind::WwwAuthenticate => Header::Authorization(value),
            ChallengeKind::ProxyAuthenticate => Header::ProxyAuthorization(value),
        }
    }

    /// The authorization value of an Authorization or Proxy-Authorization header
    pub fn as_authorization(&self) -> Option<&Authorization> {
        match self {
            Header::Authorization(a) | Header::ProxyAuthorization(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name())?;
        match self {
            Header::Via(v) => write!(f, "{}", v),
            Header::CallId(v) => write!(f, "{}", v),
            Header::CSeq(v) => write!(f, "{}", v),
            Header::WwwAuthenticate(v) | Header::ProxyAuthenticate(v) => write!(f, "{}", v),
            Header::Authorization(v) | Header::ProxyAuthorization(v) => write!(f, "{}", v),
            Header::SecurityClient(v) | Header::SecurityServer(v) | Header::SecurityVerify(v) => {
                write!(f, "{}", v)
            }
            Header::Require(v) | Header::ProxyRequire(v) => write!(f, "{}", v),
            Header::Other { value, .. } => write!(f, "{}", value),
        }
    }
}

/// A SIP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub headers: Vec<Header>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn push_header(&mut self, header: Header) {
        self.headers.push(header);
    }

    pub fn headers(&self, name: &HeaderName) -> impl Iterator<Item = &Header> + '_ {
        let name = name.clone();
        self.headers.iter().filter(move |h| h.name() == name)
    }

    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers(name).next().is_some()
    }

    /// Remove every header called `name`, returning them in order
    pub fn remove_headers(&mut self, name: &HeaderName) -> Vec<Header> {
        let (removed, kept): (Vec<Header>, Vec<Header>) = std::mem::take(&mut self.headers)
            .into_iter()
            .partition(|h| &h.name() == name);
        self.headers = kept;
        removed
    }

    pub fn call_id(&self) -> Option<&str> {
        self.headers.iter().find_map(|h| match h {
            Header::CallId(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn cseq(&self) -> Option<&CSeq> {
        self.headers.iter().find_map(|h| match h {
            Header::CSeq(c) => Some(c),
            _ => None,
        })
    }

    /// Replace the CSeq number, failing when the request has no CSeq
    pub fn set_cseq(&mut self, seq: u32) -> Result<()> {
        let cseq = self
            .headers
            .iter_mut()
            .find_map(|h| match h {
                Header::CSeq(c) => Some(c),
                _ => None,
            })
            .ok_or_else(|| AuthError::transport("Request has no CSeq header"))?;
        cseq.seq = seq;
        Ok(())
    }

    fn top_via_mut(&mut self) -> Option<&mut Via> {
        self.headers.iter_mut().find_map(|h| match h {
            Header::Via(v) => Some(v),
            _ => None,
        })
    }

    /// Branch parameter of the top Via
    pub fn branch(&self) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|h| match h {
                Header::Via(v) => Some(v),
                _ => None,
            })
            .and_then(|v| v.branch.as_deref())
    }

    /// Set the top Via branch; the stack does this when creating a transaction
    pub fn set_branch(&mut self, branch: impl Into<String>) -> Result<()> {
        let via = self
            .top_via_mut()
            .ok_or_else(|| AuthError::transport("Request has no Via header"))?;
        via.branch = Some(branch.into());
        Ok(())
    }

    /// Strip the top Via branch so the request can start a new transaction
    pub fn remove_branch(&mut self) {
        if let Some(via) = self.top_via_mut() {
            via.branch = None;
        }
    }

    /// Body as text, as used for `auth-int` digests
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} SIP/2.0\r\n", self.method, self.uri)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        write!(f, "\r\n{}", String::from_utf8_lossy(&self.body))
    }
}

/// A SIP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<Header>,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn headers(&self, name: &HeaderName) -> impl Iterator<Item = &Header> + '_ {
        let name = name.clone();
        self.headers.iter().filter(move |h| h.name() == name)
    }

    /// Raw challenge values of the given family, in order
    pub fn challenges(&self, kind: ChallengeKind) -> Vec<&str> {
        self.headers
            .iter()
            .filter_map(|h| match (kind, h) {
                (ChallengeKind::WwwAuthenticate, Header::WwwAuthenticate(v)) => Some(v.as_str()),
                (ChallengeKind::ProxyAuthenticate, Header::ProxyAuthenticate(v)) => Some(v.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Security-Server headers advertised by the server, in order
    pub fn security_server_headers(&self) -> Vec<SecurityMechanism> {
        self.headers
            .iter()
            .filter_map(|h| match h {
                Header::SecurityServer(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/2.0 {} {}\r\n", self.status, self.reason)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        write!(f, "\r\n")
    }
}

//! RFC 2617 digest response computation
//!
//! The response must be bit-exact with what the server computes, so the
//! parameters sent in the Authorization header are pinned: `qop=auth`
//! whenever the server offers any qop, nonce-count `00000001` and the
//! constant client nonce [`FIXED_CNONCE`] on every attempt.

use md5::compute as md5_compute;
use sha2::{Digest, Sha256};

use crate::cache::Credentials;
use crate::error::{AuthError, Result};
use crate::message::Request;
use crate::types::{Algorithm, Authorization, DigestChallenge, Qop};

/// Client nonce sent with every qop-protected response
pub const FIXED_CNONCE: &str = "xyz";

/// Nonce count sent with every qop-protected response
pub const FIXED_NONCE_COUNT: &str = "00000001";

/// Inputs of a digest response computation
#[derive(Debug, Clone)]
pub struct DigestParams<'a> {
    pub algorithm: Option<&'a Algorithm>,
    pub username: &'a str,
    pub realm: &'a str,
    pub password: &'a str,
    pub nonce: &'a str,
    pub cnonce: Option<&'a str>,
    pub nonce_count: Option<&'a str>,
    pub method: &'a str,
    pub uri: &'a str,
    pub body: &'a str,
    pub qop: Option<&'a Qop>,
}

fn hash(algorithm: &Algorithm, data: &str) -> Result<String> {
    match algorithm {
        Algorithm::Md5 | Algorithm::Md5Sess => Ok(format!("{:x}", md5_compute(data.as_bytes()))),
        Algorithm::Sha256 | Algorithm::Sha256Sess => Ok(hex::encode(Sha256::digest(data.as_bytes()))),
        Algorithm::Other(name) => Err(AuthError::general(format!("Unsupported digest algorithm '{}'", name))),
    }
}

/// Compute the request-digest for the given parameters
///
/// This is a pure function of its inputs.
pub fn compute_response(params: &DigestParams<'_>) -> Result<String> {
    let algorithm = params.algorithm.cloned().unwrap_or(Algorithm::Md5);

    let mut ha1 = hash(&algorithm, &format!("{}:{}:{}", params.username, params.realm, params.password))?;
    if algorithm.is_session() {
        let cnonce = params.cnonce.unwrap_or_default();
        ha1 = hash(&algorithm, &format!("{}:{}:{}", ha1, params.nonce, cnonce))?;
    }

    let ha2 = match params.qop {
        Some(Qop::AuthInt) => {
            let body_hash = hash(&algorithm, params.body)?;
            hash(&algorithm, &format!("{}:{}:{}", params.method, params.uri, body_hash))?
        }
        _ => hash(&algorithm, &format!("{}:{}", params.method, params.uri))?,
    };

    let protected = matches!(params.qop, Some(Qop::Auth | Qop::AuthInt));
    match (params.qop, params.cnonce, params.nonce_count) {
        (Some(qop), Some(cnonce), Some(nc)) if protected => hash(
            &algorithm,
            &format!("{}:{}:{}:{}:{}:{}", ha1, params.nonce, nc, cnonce, qop, ha2),
        ),
        _ => hash(&algorithm, &format!("{}:{}:{}", ha1, params.nonce, ha2)),
    }
}

/// `auth` if the server offered any qop at all
pub fn select_qop(offered: &[Qop]) -> Option<Qop> {
    if offered.is_empty() {
        None
    } else {
        Some(Qop::Auth)
    }
}

/// Build the authorization value answering `challenge` for `request`
pub fn build_authorization(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    request: &Request,
) -> Result<Authorization> {
    let qop = select_qop(&challenge.qop);
    let (cnonce, nonce_count) = match qop {
        Some(_) => (Some(FIXED_CNONCE), Some(FIXED_NONCE_COUNT)),
        None => (None, None),
    };

    let method = request.method.to_string();
    let body = request.body_str();
    let password = credentials.password.as_deref().unwrap_or_default();

    let response = compute_response(&DigestParams {
        algorithm: challenge.algorithm.as_ref(),
        username: &credentials.username,
        realm: &challenge.realm,
        password,
        nonce: &challenge.nonce,
        cnonce,
        nonce_count,
        method: &method,
        uri: &request.uri,
        body: &body,
        qop: qop.as_ref(),
    })?;

    Ok(Authorization {
        username: credentials.username.clone(),
        realm: challenge.realm.clone(),
        nonce: challenge.nonce.clone(),
        uri: request.uri.clone(),
        response,
        algorithm: challenge.algorithm.clone(),
        opaque: challenge.opaque.clone(),
        qop,
        cnonce: cnonce.map(str::to_string),
        nonce_count: nonce_count.map(str::to_string),
    })
}

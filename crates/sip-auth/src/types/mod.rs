//! Typed header values used by the authentication engine

pub mod auth;
pub mod security;

pub use auth::{Algorithm, Authorization, ChallengeKind, DigestChallenge, Qop};
pub use security::{SecurityMechanism, MEDIASEC_PARAM};

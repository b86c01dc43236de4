//! Media security (mediasec) header plumbing
//!
//! REGISTER requests of accounts using the 3GPP media security handshake
//! advertise a mechanism in Security-Client. The registrar answers the first
//! REGISTER with a challenge carrying Security-Server headers, which the
//! client echoes back as Security-Verify headers on the authenticated retry.
//! Only the header exchange and the go/no-go decision live here; the media
//! key handling itself belongs to the media layer.

pub mod header_factory;
pub mod server_cache;

pub use header_factory::SecurityHeaderFactory;
pub use server_cache::SecurityServerCache;

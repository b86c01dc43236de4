//! Per-account store of Security-Verify values

use parking_lot::RwLock;
use tracing::debug;

use super::SecurityHeaderFactory;
use crate::types::SecurityMechanism;

/// Latest Security-Server headers of an account, kept as the
/// Security-Verify values sent back to the server
///
/// Every store replaces the previous list so that headers from an older
/// negotiation never linger.
#[derive(Debug, Default)]
pub struct SecurityServerCache {
    factory: SecurityHeaderFactory,
    verify_headers: RwLock<Vec<SecurityMechanism>>,
}

impl SecurityServerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list with verify headers derived from `server_headers`
    pub fn store_headers(&self, server_headers: &[SecurityMechanism]) {
        let verify: Vec<SecurityMechanism> = server_headers
            .iter()
            .map(|h| self.factory.create_security_verify(h))
            .collect();

        debug!("Caching {} Security-Verify header(s)", verify.len());
        *self.verify_headers.write() = verify;
    }

    /// Snapshot of the current verify headers
    pub fn get_headers(&self) -> Vec<SecurityMechanism> {
        self.verify_headers.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_replaces_previous_headers() {
        let cache = SecurityServerCache::new();
        cache.store_headers(&[
            SecurityMechanism::mediasec("sdes-srtp"),
            SecurityMechanism::mediasec("msrp-tls"),
        ]);
        assert_eq!(cache.get_headers().len(), 2);

        cache.store_headers(&[SecurityMechanism::mediasec("dtls-srtp")]);
        let headers = cache.get_headers();
        assert_eq!(headers, vec![SecurityMechanism::new("dtls-srtp")]);

        cache.store_headers(&[]);
        assert!(cache.get_headers().is_empty());
    }

    #[test]
    fn test_readers_see_consistent_snapshots() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(SecurityServerCache::new());
        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100 {
                    let mechs: Vec<_> = (0..(i % 4 + 1))
                        .map(|_| SecurityMechanism::mediasec("sdes-srtp"))
                        .collect();
                    cache.store_headers(&mechs);
                }
            })
        };

        for _ in 0..100 {
            let snapshot = cache.get_headers();
            assert!(snapshot.iter().all(|h| h.mechanism == "sdes-srtp"));
            assert!(snapshot.len() <= 4);
        }
        writer.join().unwrap();
    }
}

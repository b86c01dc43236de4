//! # SIP-Auth - Digest authentication for RVoIP clients
//!
//! This crate answers SIP authentication challenges on behalf of a client
//! account. It keeps one set of credentials per realm, tells a retried
//! request apart from a request whose credentials were just rejected, and
//! gates REGISTER requests on the 3GPP media security (mediasec) handshake.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!   401/407/403 ──►│      SecurityManager      │──► new ClientTransaction
//!                  └──────────────────────────┘
//!                    │        │          │
//!        CredentialsCache  digest   SecurityServerCache
//!                    │                   │
//!   SecurityAuthority / SecretStore / ProvisioningClient / TransactionFactory
//!                 (injected by the application and the SIP stack)
//! ```
//!
//! The crate performs no network I/O of its own. Prompting the user, storing
//! secrets, provisioning and transaction creation are all reached through
//! the traits in [`collaborators`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rvoip_sip_auth::{
//!     ClientTransaction, Credentials, CredentialsReason, Request, Response, Result,
//!     SecretStore, SecurityAuthority, SecurityConfig, SecurityManager, TransactionFactory,
//! };
//!
//! struct Prompt;
//!
//! #[async_trait::async_trait]
//! impl SecurityAuthority for Prompt {
//!     async fn obtain_credentials(
//!         &self,
//!         _display_name: &str,
//!         defaults: Credentials,
//!         _reason: CredentialsReason,
//!         _protocol_tag: &str,
//!     ) -> Option<Credentials> {
//!         Some(Credentials::new(defaults.username, "secret"))
//!     }
//! }
//!
//! struct NoStore;
//!
//! impl SecretStore for NoStore {
//!     fn load_password(&self, _account_id: &str) -> Option<String> { None }
//!     fn store_password(&self, _account_id: &str, _password: Option<String>) {}
//! }
//!
//! struct Stack;
//!
//! #[async_trait::async_trait]
//! impl TransactionFactory for Stack {
//!     async fn create_client_transaction(&self, mut request: Request) -> Result<ClientTransaction> {
//!         request.set_branch("z9hG4bK-2")?;
//!         Ok(ClientTransaction::new("z9hG4bK-2", request))
//!     }
//! }
//!
//! # async fn example(challenge: Response, sent: ClientTransaction) -> Result<()> {
//! let manager = SecurityManager::new(
//!     SecurityConfig::new("alice@example.com", "alice"),
//!     Arc::new(Prompt),
//!     Arc::new(NoStore),
//!     None,
//!     Arc::new(Stack),
//! )?;
//!
//! let _retry = manager.handle_challenge(&challenge, &sent, None).await?;
//! // hand the retry transaction to the stack for sending
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod collaborators;
pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod manager;
pub mod message;
pub mod parser;
pub mod security;
pub mod types;

pub use cache::{Credentials, CredentialsCache, CredentialsCacheEntry};
pub use collaborators::{
    ClientTransaction, CredentialsReason, DialogSequence, ProvisioningClient, SecretStore,
    SecurityAuthority, TransactionFactory,
};
pub use config::SecurityConfig;
pub use error::{AuthError, ErrorCode, Result};
pub use logging::{setup_logging, LoggingConfig};
pub use manager::SecurityManager;
pub use message::{CSeq, Header, HeaderName, Method, Request, Response, Via};
pub use security::{SecurityHeaderFactory, SecurityServerCache};
pub use types::{Algorithm, Authorization, ChallengeKind, DigestChallenge, Qop, SecurityMechanism};

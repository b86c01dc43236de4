//! Interfaces the [`SecurityManager`](crate::SecurityManager) is built from
//!
//! Everything that prompts a user, touches persistent storage, talks to a
//! provisioning server or creates transactions is injected through these
//! traits, so the state machine itself never performs I/O.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::Credentials;
use crate::error::Result;
use crate::message::Request;

/// Why the security authority is being asked for credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialsReason {
    /// First challenge for a realm with no stored secret
    AuthenticationRequired,
}

/// Source of interactively obtained credentials (usually a UI prompt)
#[async_trait]
pub trait SecurityAuthority: Send + Sync {
    /// Ask for credentials; `None` means the user canceled
    ///
    /// May take as long as the user needs to answer.
    async fn obtain_credentials(
        &self,
        display_name: &str,
        defaults: Credentials,
        reason: CredentialsReason,
        protocol_tag: &str,
    ) -> Option<Credentials>;
}

/// Persistent storage for account secrets
pub trait SecretStore: Send + Sync {
    fn load_password(&self, account_id: &str) -> Option<String>;

    /// Store a secret, or remove it when `password` is `None`
    fn store_password(&self, account_id: &str, password: Option<String>);
}

/// Remote provisioning client able to deliver a fresh account secret
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Fetch and apply the latest configuration, updating the secret store
    /// out of band when it carries a new secret
    async fn get_and_store_fresh_config(&self) -> Result<()>;
}

/// Local sequence numbering of a dialog owned by the protocol stack
pub trait DialogSequence: Send + Sync {
    fn local_seq_number(&self) -> u32;

    /// Increment and return the new local sequence number
    fn increment_local_seq_number(&self) -> u32;
}

/// A client transaction created by the protocol stack but not yet sent
#[derive(Clone)]
pub struct ClientTransaction {
    pub branch_id: String,
    pub request: Request,
    pub dialog: Option<Arc<dyn DialogSequence>>,
}

impl ClientTransaction {
    pub fn new(branch_id: impl Into<String>, request: Request) -> Self {
        Self {
            branch_id: branch_id.into(),
            request,
            dialog: None,
        }
    }

    pub fn with_dialog(mut self, dialog: Arc<dyn DialogSequence>) -> Self {
        self.dialog = Some(dialog);
        self
    }
}

impl fmt::Debug for ClientTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTransaction")
            .field("branch_id", &self.branch_id)
            .field("method", &self.request.method)
            .field("in_dialog", &self.dialog.is_some())
            .finish()
    }
}

/// Transaction creation in the protocol stack
#[async_trait]
pub trait TransactionFactory: Send + Sync {
    /// Create a client transaction for `request`, assigning it a fresh
    /// branch identifier
    async fn create_client_transaction(&self, request: Request) -> Result<ClientTransaction>;
}

//! The authentication state machine
//!
//! [`SecurityManager`] answers 401/407 challenges and recovers from 403
//! responses for one account:
//!
//! ```text
//! UNCHALLENGED ─► CHALLENGED(realm) ─┬─► REUSE_CACHED ─────────────┐
//!                                    ├─► PROMPT_OR_LOAD ───────────┤
//!                                    └─► REFRESH_VIA_PROVISIONING ─┤
//!                                                                  ▼
//!                        SENT ◄── SECURITY_GATE (REGISTER) ◄── ATTACH_HEADER
//!
//! FORBIDDEN ─► CACHE_WIPE ─► SENT
//! ```
//!
//! Both paths hand a new, unsent [`ClientTransaction`] back to the caller.
//! Any further challenge on that transaction comes back through
//! [`SecurityManager::handle_challenge`], where its branch identifier tells
//! whether the credentials sent with it were rejected.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{Credentials, CredentialsCache, CredentialsCacheEntry};
use crate::collaborators::{
    ClientTransaction, CredentialsReason, ProvisioningClient, SecretStore, SecurityAuthority,
    TransactionFactory,
};
use crate::config::SecurityConfig;
use crate::digest;
use crate::error::{AuthError, Result};
use crate::message::{Header, HeaderName, Method, Request, Response};
use crate::security::{SecurityHeaderFactory, SecurityServerCache};
use crate::types::{Authorization, ChallengeKind, DigestChallenge, SecurityMechanism};

/// Digest authentication and mediasec negotiation for one account
pub struct SecurityManager {
    config: SecurityConfig,
    security_authority: Arc<dyn SecurityAuthority>,
    secret_store: Arc<dyn SecretStore>,
    provisioning: Option<Arc<dyn ProvisioningClient>>,
    transaction_factory: Arc<dyn TransactionFactory>,
    header_factory: SecurityHeaderFactory,
    cached_credentials: CredentialsCache,
    security_server_cache: SecurityServerCache,
    /// Serializes challenge handling for this account
    auth_lock: Mutex<()>,
}

impl SecurityManager {
    /// Create a manager for the account described by `config`
    pub fn new(
        config: SecurityConfig,
        security_authority: Arc<dyn SecurityAuthority>,
        secret_store: Arc<dyn SecretStore>,
        provisioning: Option<Arc<dyn ProvisioningClient>>,
        transaction_factory: Arc<dyn TransactionFactory>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            security_authority,
            secret_store,
            provisioning,
            transaction_factory,
            header_factory: SecurityHeaderFactory::new(),
            cached_credentials: CredentialsCache::new(),
            security_server_cache: SecurityServerCache::new(),
            auth_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn credentials_cache(&self) -> &CredentialsCache {
        &self.cached_credentials
    }

    pub fn security_server_cache(&self) -> &SecurityServerCache {
        &self.security_server_cache
    }

    /// Security-Verify values from the last successful negotiation
    pub fn security_verify_headers(&self) -> Vec<SecurityMechanism> {
        self.security_server_cache.get_headers()
    }

    /// Last authorization sent on the call with `call_id`
    pub fn cached_authorization_header(&self, call_id: &str) -> Option<Authorization> {
        self.cached_credentials.get_cached_authorization_header(call_id)
    }

    /// Attach the mediasec client headers to an outgoing REGISTER
    ///
    /// Returns whether headers were added.
    pub fn prepare_register(&self, request: &mut Request) -> bool {
        if !self.config.mediasec_enabled {
            return false;
        }
        self.header_factory
            .add_security_client_headers(request, &self.config.mediasec_mechanism)
    }

    /// Answer a 401 or 407 response
    ///
    /// The challenged request is cloned into a new transaction carrying one
    /// authorization header per challenged realm. A failure for any realm
    /// fails the whole call; nothing partial is returned.
    ///
    /// `explicit_seq` overrides the CSeq of the retried request.
    pub async fn handle_challenge(
        &self,
        challenge_response: &Response,
        challenged_transaction: &ClientTransaction,
        explicit_seq: Option<u32>,
    ) -> Result<ClientTransaction> {
        let _guard = self.auth_lock.lock().await;

        let kind = ChallengeKind::from_status(challenge_response.status).ok_or_else(|| {
            AuthError::general(format!(
                "Status {} is not an authentication challenge",
                challenge_response.status
            ))
        })?;

        debug!(
            "Handling {} challenge for {} (branch {})",
            challenge_response.status,
            challenged_transaction.request.method,
            challenged_transaction.branch_id
        );

        let mut request = challenged_transaction.request.clone();
        request.remove_branch();
        request.remove_headers(&kind.authorization_header());

        // Fail closed before touching credentials.
        let server_security = if request.method == Method::Register {
            Some(self.check_security_gate(challenge_response)?)
        } else {
            None
        };

        let challenges = challenge_response.challenges(kind);
        if challenges.is_empty() {
            return Err(AuthError::general(format!(
                "{} response carries no {} header",
                challenge_response.status,
                kind.challenge_header()
            )));
        }
        let challenges = challenges
            .into_iter()
            .map(DigestChallenge::parse)
            .collect::<Result<Vec<_>>>()?;

        let mut retry = self.transaction_factory.create_client_transaction(request).await?;
        apply_sequence_number(&mut retry, explicit_seq)?;

        let window = self.config.branch_correlation_window();
        for challenge in &challenges {
            let started = Instant::now();
            let mut entry = self
                .resolve_entry(challenge, &challenged_transaction.branch_id)
                .await?;

            let credentials = entry.credentials.clone().ok_or_else(|| {
                AuthError::failed(format!("No credentials available for realm '{}'", challenge.realm))
            })?;

            if started.elapsed() > window {
                debug!(
                    "Credentials for realm '{}' took {:?} to obtain; not recording branch {}",
                    challenge.realm,
                    started.elapsed(),
                    retry.branch_id
                );
            } else {
                entry.push_branch_id(retry.branch_id.clone());
            }

            let authorization = digest::build_authorization(challenge, &credentials, &retry.request)?;
            retry
                .request
                .push_header(Header::authorization_for(kind, authorization.clone()));

            self.cached_credentials.cache_entry(challenge.realm.clone(), entry);
            if let Some(call_id) = retry.request.call_id() {
                self.cached_credentials
                    .cache_authorization_header(call_id.to_string(), authorization);
            }
        }

        if let Some(server_headers) = server_security {
            if self.config.mediasec_enabled {
                self.security_server_cache.store_headers(&server_headers);
                retry.request.remove_headers(&HeaderName::SecurityVerify);
                for verify in self.security_server_cache.get_headers() {
                    retry.request.push_header(Header::SecurityVerify(verify));
                }
            }
        }

        info!(
            "Re-originating {} with credentials for {} realm(s) on branch {}",
            retry.request.method,
            challenges.len(),
            retry.branch_id
        );
        Ok(retry)
    }

    /// Recover from a 403 Forbidden
    ///
    /// All cached credentials and the stored secret are dropped and the
    /// request is re-sent without authorization. Every realm it was
    /// authorized for gets a placeholder entry seeded with the new branch,
    /// so a challenge on that branch is treated as a rejection right away.
    pub async fn handle_forbidden_response(
        &self,
        forbidden_response: &Response,
        ended_transaction: &ClientTransaction,
    ) -> Result<ClientTransaction> {
        let _guard = self.auth_lock.lock().await;

        warn!(
            "{} {} for {}; dropping cached credentials for account {}",
            forbidden_response.status,
            forbidden_response.reason,
            ended_transaction.request.method,
            self.config.account_id
        );

        self.cached_credentials.clear();
        self.secret_store.store_password(&self.config.account_id, None);

        let mut request = ended_transaction.request.clone();
        request.remove_branch();

        let mut authorized: Vec<(String, String)> = Vec::new();
        for name in [HeaderName::Authorization, HeaderName::ProxyAuthorization] {
            for header in request.remove_headers(&name) {
                if let Some(auth) = header.as_authorization() {
                    authorized.push((auth.realm.clone(), auth.username.clone()));
                }
            }
        }

        let next_seq = request
            .cseq()
            .map(|c| c.seq.saturating_add(1))
            .ok_or_else(|| AuthError::transport("Forbidden request has no CSeq header"))?;
        request.set_cseq(next_seq)?;

        let retry = self.transaction_factory.create_client_transaction(request).await?;
        if let Some(dialog) = &retry.dialog {
            if dialog.local_seq_number() != next_seq {
                dialog.increment_local_seq_number();
            }
        }

        for (realm, username) in authorized {
            let mut entry = CredentialsCacheEntry::new(Credentials::new(username, ""));
            entry.push_branch_id(retry.branch_id.clone());
            self.cached_credentials.cache_entry(realm, entry);
        }

        Ok(retry)
    }

    /// Reject REGISTER challenges whose Security-Server headers do not match
    /// this account's mediasec setting
    fn check_security_gate(&self, response: &Response) -> Result<Vec<SecurityMechanism>> {
        let server_headers = response.security_server_headers();

        if self.config.mediasec_enabled {
            if server_headers.is_empty() {
                warn!("Mediasec is enabled but the registrar sent no Security-Server header");
                return Err(AuthError::canceled("Registrar did not offer media security"));
            }
            if !self
                .header_factory
                .does_supported_security_header_exist(&server_headers, &self.config.mediasec_mechanism)
            {
                warn!(
                    "Registrar does not offer mediasec mechanism '{}'",
                    self.config.mediasec_mechanism
                );
                return Err(AuthError::canceled(format!(
                    "Registrar does not support '{}'",
                    self.config.mediasec_mechanism
                )));
            }
        } else if !server_headers.is_empty() {
            warn!("Registrar requires media security but it is disabled for this account");
            return Err(AuthError::canceled("Registrar requires media security"));
        }

        Ok(server_headers)
    }

    /// Pick the credentials entry answering `challenge`
    async fn resolve_entry(
        &self,
        challenge: &DigestChallenge,
        challenged_branch: &str,
    ) -> Result<CredentialsCacheEntry> {
        let realm = challenge.realm.as_str();

        match self.cached_credentials.remove(realm) {
            Some(mut entry) => {
                let saw_this_branch = entry.pop_branch_id(challenged_branch);
                if saw_this_branch && !challenge.stale {
                    self.refresh_rejected_credentials(realm, entry).await
                } else {
                    debug!("Reusing cached credentials for realm '{}'", realm);
                    Ok(entry)
                }
            }
            None => self.load_or_obtain_credentials(realm).await,
        }
    }

    /// The credentials in `entry` were rejected on the exact attempt they
    /// were sent with. Only a different secret from provisioning can help.
    async fn refresh_rejected_credentials(
        &self,
        realm: &str,
        entry: CredentialsCacheEntry,
    ) -> Result<CredentialsCacheEntry> {
        warn!("Credentials for realm '{}' were rejected; refreshing account secret", realm);

        let (username, old_password) = match entry.credentials {
            Some(c) => (c.username, c.password.unwrap_or_default()),
            None => (self.config.user_id.clone(), String::new()),
        };

        self.secret_store.store_password(&self.config.account_id, None);

        if let Some(provisioning) = &self.provisioning {
            if let Err(e) = provisioning.get_and_store_fresh_config().await {
                warn!("Provisioning refresh failed: {}", e);
            }
        }

        match self.secret_store.load_password(&self.config.account_id) {
            Some(password) if !password.is_empty() && password != old_password => {
                info!("Provisioning supplied a new secret for realm '{}'", realm);
                Ok(CredentialsCacheEntry::new(Credentials::new(username, password)))
            }
            _ => Err(AuthError::failed(format!(
                "Credentials for realm '{}' were rejected and no replacement is available",
                realm
            ))),
        }
    }

    /// First challenge for `realm`: stored secret, else ask the user
    async fn load_or_obtain_credentials(&self, realm: &str) -> Result<CredentialsCacheEntry> {
        if let Some(password) = self
            .secret_store
            .load_password(&self.config.account_id)
            .filter(|p| !p.is_empty())
        {
            info!("Using stored secret for realm '{}'", realm);
            let credentials = Credentials::new(self.config.user_id.clone(), password).with_persistent(true);
            return Ok(CredentialsCacheEntry::new(credentials));
        }

        info!("No stored secret for realm '{}'; asking for credentials", realm);
        let defaults = Credentials::username_only(self.config.user_id.clone());
        let credentials = self
            .security_authority
            .obtain_credentials(
                self.config.prompt_name(),
                defaults,
                CredentialsReason::AuthenticationRequired,
                &self.config.protocol_tag,
            )
            .await
            .ok_or_else(|| AuthError::canceled(format!("User canceled authentication for realm '{}'", realm)))?;

        if !credentials.has_password() {
            return Err(AuthError::canceled(format!("No password entered for realm '{}'", realm)));
        }
        if credentials.persistent {
            self.secret_store
                .store_password(&self.config.account_id, credentials.password.clone());
        }

        Ok(CredentialsCacheEntry::new(credentials))
    }
}

/// Give the retried request its CSeq
fn apply_sequence_number(retry: &mut ClientTransaction, explicit_seq: Option<u32>) -> Result<()> {
    let seq = match (explicit_seq, &retry.dialog) {
        (Some(seq), _) => seq,
        (None, Some(dialog)) => dialog.increment_local_seq_number(),
        (None, None) => retry
            .request
            .cseq()
            .map(|c| c.seq.saturating_add(1))
            .ok_or_else(|| AuthError::transport("Challenged request has no CSeq header"))?,
    };
    retry.request.set_cseq(seq)
}

//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use rvoip_sip_auth::{
    setup_logging, AuthError, CSeq, ClientTransaction, Credentials, CredentialsReason,
    DialogSequence, Header, LoggingConfig, Method, ProvisioningClient, Request, Response, Result,
    SecretStore, SecurityAuthority, SecurityConfig, SecurityManager, SecurityMechanism,
    TransactionFactory, Via,
};
use tracing::Level;

pub const ACCOUNT: &str = "alice@example.com";
pub const REALM: &str = "example.com";

/// Security authority answering from a queue of canned results
#[derive(Default)]
pub struct MockAuthority {
    answers: Mutex<VecDeque<Option<Credentials>>>,
    pub calls: Mutex<Vec<(String, String, CredentialsReason)>>,
    delay: Option<Duration>,
}

impl MockAuthority {
    pub fn answering(answers: Vec<Option<Credentials>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SecurityAuthority for MockAuthority {
    async fn obtain_credentials(
        &self,
        display_name: &str,
        defaults: Credentials,
        reason: CredentialsReason,
        _protocol_tag: &str,
    ) -> Option<Credentials> {
        self.calls
            .lock()
            .unwrap()
            .push((display_name.to_string(), defaults.username.clone(), reason));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

/// Secret store holding a single secret
#[derive(Default)]
pub struct MockSecretStore {
    password: Mutex<Option<String>>,
    pub stores: Mutex<Vec<Option<String>>>,
}

impl MockSecretStore {
    pub fn with_password(password: &str) -> Self {
        Self {
            password: Mutex::new(Some(password.to_string())),
            ..Default::default()
        }
    }

    pub fn current(&self) -> Option<String> {
        self.password.lock().unwrap().clone()
    }

    /// Change the secret without recording a store call
    pub fn set(&self, password: Option<&str>) {
        *self.password.lock().unwrap() = password.map(str::to_string);
    }
}

impl SecretStore for MockSecretStore {
    fn load_password(&self, account_id: &str) -> Option<String> {
        assert_eq!(account_id, ACCOUNT);
        self.current()
    }

    fn store_password(&self, account_id: &str, password: Option<String>) {
        assert_eq!(account_id, ACCOUNT);
        self.stores.lock().unwrap().push(password.clone());
        *self.password.lock().unwrap() = password;
    }
}

/// Provisioning client that writes a configured secret into the store
pub struct MockProvisioning {
    store: Arc<MockSecretStore>,
    fresh_password: Option<String>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockProvisioning {
    pub fn supplying(store: Arc<MockSecretStore>, fresh_password: Option<&str>) -> Self {
        Self {
            store,
            fresh_password: fresh_password.map(str::to_string),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(store: Arc<MockSecretStore>) -> Self {
        Self {
            fail: true,
            ..Self::supplying(store, None)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvisioningClient for MockProvisioning {
    async fn get_and_store_fresh_config(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AuthError::transport("provisioning server unreachable"));
        }
        if let Some(password) = &self.fresh_password {
            self.store.set(Some(password));
        }
        Ok(())
    }
}

/// Dialog with a shared local sequence number
pub struct MockDialog {
    pub local_seq: AtomicU32,
}

impl MockDialog {
    pub fn new(seq: u32) -> Self {
        Self {
            local_seq: AtomicU32::new(seq),
        }
    }
}

impl DialogSequence for MockDialog {
    fn local_seq_number(&self) -> u32 {
        self.local_seq.load(Ordering::SeqCst)
    }

    fn increment_local_seq_number(&self) -> u32 {
        self.local_seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Transaction factory numbering branches `z9hG4bK-retry-N`
#[derive(Default)]
pub struct MockFactory {
    counter: AtomicUsize,
    dialog: Option<Arc<MockDialog>>,
    fail: bool,
}

impl MockFactory {
    pub fn with_dialog(dialog: Arc<MockDialog>) -> Self {
        Self {
            dialog: Some(dialog),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionFactory for MockFactory {
    async fn create_client_transaction(&self, mut request: Request) -> Result<ClientTransaction> {
        if self.fail {
            return Err(AuthError::transport("transport closed"));
        }
        assert!(request.branch().is_none(), "request must arrive without a branch");
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let branch = format!("z9hG4bK-retry-{}", n);
        request.set_branch(branch.clone())?;
        let mut tx = ClientTransaction::new(branch, request);
        if let Some(dialog) = &self.dialog {
            tx = tx.with_dialog(dialog.clone());
        }
        Ok(tx)
    }
}

static LOGGING: Once = Once::new();

/// Route engine logs to the test output; RUST_LOG narrows them further
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = setup_logging(LoggingConfig::new(Level::DEBUG).with_file_info());
    });
}

pub struct Harness {
    pub manager: Arc<SecurityManager>,
    pub authority: Arc<MockAuthority>,
    pub store: Arc<MockSecretStore>,
    pub provisioning: Option<Arc<MockProvisioning>>,
    pub factory: Arc<MockFactory>,
}

pub fn harness(
    config: SecurityConfig,
    authority: MockAuthority,
    store: Arc<MockSecretStore>,
    provisioning: Option<MockProvisioning>,
    factory: MockFactory,
) -> Harness {
    init_logging();
    let authority = Arc::new(authority);
    let provisioning = provisioning.map(Arc::new);
    let factory = Arc::new(factory);
    let manager = SecurityManager::new(
        config,
        authority.clone(),
        store.clone(),
        provisioning.clone().map(|p| p as Arc<dyn ProvisioningClient>),
        factory.clone(),
    )
    .expect("valid config");

    Harness {
        manager: Arc::new(manager),
        authority,
        store,
        provisioning,
        factory,
    }
}

pub fn config() -> SecurityConfig {
    SecurityConfig::new(ACCOUNT, "alice").with_display_name("Alice")
}

pub fn request(method: Method, branch: &str, seq: u32) -> Request {
    Request::new(method.clone(), "sip:example.com")
        .with_header(Header::Via(Via::new("UDP", "192.168.1.10:5060", Some(branch))))
        .with_header(Header::CallId("call-1@192.168.1.10".to_string()))
        .with_header(Header::CSeq(CSeq { seq, method }))
}

pub fn transaction(method: Method, branch: &str, seq: u32) -> ClientTransaction {
    ClientTransaction::new(branch, request(method, branch, seq))
}

pub fn challenge(status: u16, realm: &str, nonce: &str) -> Response {
    let value = format!("Digest realm=\"{}\", nonce=\"{}\", qop=\"auth\", algorithm=MD5", realm, nonce);
    match status {
        407 => Response::new(407, "Proxy Authentication Required").with_header(Header::ProxyAuthenticate(value)),
        _ => Response::new(401, "Unauthorized").with_header(Header::WwwAuthenticate(value)),
    }
}

pub fn stale_challenge(realm: &str, nonce: &str) -> Response {
    Response::new(401, "Unauthorized").with_header(Header::WwwAuthenticate(format!(
        "Digest realm=\"{}\", nonce=\"{}\", qop=\"auth\", stale=true",
        realm, nonce
    )))
}

pub fn with_security_server(response: Response, mechanisms: &[&str]) -> Response {
    mechanisms.iter().fold(response, |r, m| {
        r.with_header(Header::SecurityServer(SecurityMechanism::mediasec(*m)))
    })
}

//! Per-account security configuration
//!
//! A [`SecurityConfig`] describes one SIP account as seen by the
//! [`SecurityManager`](crate::SecurityManager): which identity to offer when
//! credentials are requested, and whether REGISTER requests must go through
//! the mediasec handshake.
//!
//! # Examples
//!
//! ```rust
//! use rvoip_sip_auth::SecurityConfig;
//!
//! let config = SecurityConfig::new("alice@example.com", "alice")
//!     .with_display_name("Alice")
//!     .with_mediasec("sdes-srtp");
//!
//! assert!(config.mediasec_enabled);
//! assert_eq!(config.branch_correlation_window().as_secs(), 25);
//! ```
//!
//! The same configuration can be loaded from TOML:
//!
//! ```rust
//! use rvoip_sip_auth::SecurityConfig;
//!
//! let config = SecurityConfig::from_toml_str(r#"
//!     account_id = "alice@example.com"
//!     user_id = "alice"
//!     mediasec_enabled = true
//! "#).unwrap();
//!
//! assert_eq!(config.mediasec_mechanism, "sdes-srtp");
//! ```

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Default mechanism advertised in Security-Client headers
pub const DEFAULT_MEDIASEC_MECHANISM: &str = "sdes-srtp";

/// Default protocol tag passed to the security authority
pub const DEFAULT_PROTOCOL_TAG: &str = "SIP";

/// Seconds after which a freshly resolved entry no longer records the retry branch
pub const DEFAULT_BRANCH_CORRELATION_WINDOW_SECS: u64 = 25;

fn default_mediasec_mechanism() -> String {
    DEFAULT_MEDIASEC_MECHANISM.to_string()
}

fn default_protocol_tag() -> String {
    DEFAULT_PROTOCOL_TAG.to_string()
}

fn default_window_secs() -> u64 {
    DEFAULT_BRANCH_CORRELATION_WINDOW_SECS
}

/// Security configuration for a single SIP account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Key under which the account's secret is persisted
    pub account_id: String,

    /// Username used with persisted secrets and offered as the default
    /// when prompting for credentials
    pub user_id: String,

    /// Human readable account name shown by the security authority
    #[serde(default)]
    pub display_name: Option<String>,

    /// Whether REGISTER requests negotiate media security (3GPP mediasec)
    #[serde(default)]
    pub mediasec_enabled: bool,

    /// Mechanism this client supports in the mediasec handshake
    #[serde(default = "default_mediasec_mechanism")]
    pub mediasec_mechanism: String,

    /// Protocol tag handed to the security authority
    #[serde(default = "default_protocol_tag")]
    pub protocol_tag: String,

    /// Credential resolutions slower than this do not record the retry
    /// branch, see [`SecurityConfig::branch_correlation_window`]
    #[serde(default = "default_window_secs")]
    pub branch_correlation_window_secs: u64,
}

impl SecurityConfig {
    /// Create a configuration with mediasec disabled and default timings
    pub fn new(account_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            user_id: user_id.into(),
            display_name: None,
            mediasec_enabled: false,
            mediasec_mechanism: default_mediasec_mechanism(),
            protocol_tag: default_protocol_tag(),
            branch_correlation_window_secs: DEFAULT_BRANCH_CORRELATION_WINDOW_SECS,
        }
    }

    /// Set the display name offered to the security authority
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Enable the mediasec handshake with the given mechanism
    pub fn with_mediasec(mut self, mechanism: impl Into<String>) -> Self {
        self.mediasec_enabled = true;
        self.mediasec_mechanism = mechanism.into();
        self
    }

    /// Override the protocol tag
    pub fn with_protocol_tag(mut self, tag: impl Into<String>) -> Self {
        self.protocol_tag = tag.into();
        self
    }

    /// Override the branch correlation window
    pub fn with_branch_correlation_window(mut self, window: Duration) -> Self {
        self.branch_correlation_window_secs = window.as_secs();
        self
    }

    /// Servers that tear down a dialog after a delay may re-challenge a
    /// retried request even though the credentials were right. When
    /// resolving credentials takes longer than this window the retry branch
    /// is not recorded, so such a challenge is not mistaken for a wrong
    /// password.
    pub fn branch_correlation_window(&self) -> Duration {
        Duration::from_secs(self.branch_correlation_window_secs)
    }

    /// Name shown when prompting, falling back to the account id
    pub fn prompt_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.account_id)
    }

    /// Parse a configuration from a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: SecurityConfig = toml::from_str(input)
            .map_err(|e| AuthError::config(format!("Invalid security configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(AuthError::config("account_id must not be empty"));
        }
        if self.user_id.trim().is_empty() {
            return Err(AuthError::config("user_id must not be empty"));
        }
        if self.mediasec_enabled && self.mediasec_mechanism.trim().is_empty() {
            return Err(AuthError::config("mediasec is enabled but no mechanism is configured"));
        }
        Ok(())
    }
}

//! Tenant credentials for the identity service.
//!
//! Credentials are fixed for the lifetime of a client. The password is kept
//! in a [`SecretString`] so it never shows up in `Debug` output or logs; it is
//! only exposed when the token request body is serialized.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Username, password, tenant and region used to obtain tokens.
pub struct Credentials {
    username: String,
    password: SecretString,
    tenant_id: String,
    region: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        tenant_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            tenant_id: tenant_id.into(),
            region: region.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Region code, e.g. `tyo1`. Selects both the identity host and the
    /// object-store endpoint in the service catalog.
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials::new("gncu12345678", "hunter2", "0123abcd", "tyo1");
        let debug = format!("{creds:?}");
        assert!(debug.contains("gncu12345678"));
        assert!(debug.contains("tyo1"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn password_is_available_to_the_crate() {
        let creds = Credentials::new("user", "s3cret", "tenant", "sjc1");
        assert_eq!(creds.password(), "s3cret");
        assert_eq!(creds.tenant_id(), "tenant");
        assert_eq!(creds.region(), "sjc1");
    }
}

use std::path::PathBuf;

/// Credentials and target principal consulted at connect time. Construction
/// performs no I/O — the key/password material is only read when the
/// transport actually connects.
#[derive(Debug, Clone)]
pub enum Auth {
    Password {
        username: String,
        password: String,
    },
    PublicKey {
        username: String,
        private_key_path: PathBuf,
        passphrase: Option<String>,
    },
    /// Kerberos/GSSAPI, keyed by the target service principal.
    Gssapi {
        username: String,
        principal: String,
    },
}

impl Auth {
    pub fn username(&self) -> &str {
        match self {
            Auth::Password { username, .. } => username,
            Auth::PublicKey { username, .. } => username,
            Auth::Gssapi { username, .. } => username,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn username_is_exposed_for_every_auth_variant() {
        let password = Auth::Password { username: "opr".to_string(), password: "x".to_string() };
        let gssapi = Auth::Gssapi { username: "opr".to_string(), principal: "host/svc".to_string() };
        assert_eq!(password.username(), "opr");
        assert_eq!(gssapi.username(), "opr");
    }
}

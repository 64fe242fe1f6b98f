// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Security UsernameToken with PasswordDigest.
//!
//! `PasswordDigest = Base64(SHA1(nonce + created + password))`, where `nonce`
//! is the raw 16 random bytes (sent Base64 encoded) and `created` the UTC
//! timestamp string exactly as it appears in `wsu:Created`.

use crate::config::{Credentials, NS_WSSE, NS_WSU, WSSE_BASE64_BINARY, WSSE_PASSWORD_DIGEST};
use crate::error::{Error, Result};
use crate::soap::envelope::xml_escape;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use ring::rand::{SecureRandom, SystemRandom};

const NONCE_LEN: usize = 16;

/// A fully computed token, ready to be rendered into a SOAP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameToken {
    /// Account name.
    pub username: String,
    /// Base64 SHA-1 digest.
    pub password_digest: String,
    /// Base64 nonce.
    pub nonce: String,
    /// `wsu:Created` timestamp.
    pub created: String,
}

impl UsernameToken {
    /// Build a token with a fresh nonce, `created` shifted by `clock_offset`
    /// to match the device clock.
    pub fn generate(credentials: &Credentials, clock_offset: chrono::Duration) -> Result<Self> {
        let mut nonce = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce)
            .map_err(|_| Error::UnexpectedFailure("secure random generator failed".into()))?;
        let created = (chrono::Utc::now() + clock_offset)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        Ok(Self::with_nonce(credentials, &nonce, created))
    }

    /// Deterministic construction from a known nonce and timestamp.
    pub fn with_nonce(credentials: &Credentials, nonce: &[u8], created: String) -> Self {
        Self {
            username: credentials.username.clone(),
            password_digest: password_digest(nonce, &created, &credentials.password),
            nonce: BASE64.encode(nonce),
            created,
        }
    }

    /// Render the `wsse:Security` header element.
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                r#"<wsse:Security s:mustUnderstand="1" xmlns:wsse="{wsse}" xmlns:wsu="{wsu}">"#,
                "<wsse:UsernameToken>",
                "<wsse:Username>{user}</wsse:Username>",
                r#"<wsse:Password Type="{pwd_type}">{pwd}</wsse:Password>"#,
                r#"<wsse:Nonce EncodingType="{nonce_enc}">{nonce}</wsse:Nonce>"#,
                "<wsu:Created>{created}</wsu:Created>",
                "</wsse:UsernameToken>",
                "</wsse:Security>"
            ),
            wsse = NS_WSSE,
            wsu = NS_WSU,
            user = xml_escape(&self.username),
            pwd_type = WSSE_PASSWORD_DIGEST,
            pwd = self.password_digest,
            nonce_enc = WSSE_BASE64_BINARY,
            nonce = self.nonce,
            created = self.created,
        )
    }
}

/// `Base64(SHA1(nonce + created + password))`.
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut input = Vec::with_capacity(nonce.len() + created.len() + password.len());
    input.extend_from_slice(nonce);
    input.extend_from_slice(created.as_bytes());
    input.extend_from_slice(password.as_bytes());
    BASE64.encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, &input).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_base64_sha1() {
        let d = password_digest(b"0123456789abcdef", "2026-01-01T00:00:00Z", "secret");
        let raw = BASE64.decode(&d).unwrap();
        assert_eq!(raw.len(), 20);
    }

    #[test]
    fn test_digest_known_answer() {
        // SHA1(nonce bytes || created || password), Base64 encoded.
        assert_eq!(
            password_digest(&[1, 2, 3, 4], "2024-01-01T00:00:00Z", "pass"),
            "G15M//M+4ZfiZeYfwfyLkYJzYek="
        );
    }

    #[test]
    fn test_token_carries_known_digest() {
        let creds = Credentials::new("admin", "pass");
        let token = UsernameToken::with_nonce(&creds, &[1, 2, 3, 4], "2024-01-01T00:00:00Z".into());
        assert_eq!(token.nonce, "AQIDBA==");
        assert!(token
            .to_xml()
            .contains(">G15M//M+4ZfiZeYfwfyLkYJzYek=</wsse:Password>"));
    }

    #[test]
    fn test_digest_depends_on_every_input() {
        let base = password_digest(b"nonce-aaaaaaaaaa", "2026-01-01T00:00:00Z", "pw");
        assert_ne!(
            base,
            password_digest(b"nonce-bbbbbbbbbb", "2026-01-01T00:00:00Z", "pw")
        );
        assert_ne!(
            base,
            password_digest(b"nonce-aaaaaaaaaa", "2026-01-01T00:00:01Z", "pw")
        );
        assert_ne!(
            base,
            password_digest(b"nonce-aaaaaaaaaa", "2026-01-01T00:00:00Z", "pw2")
        );
    }

    #[test]
    fn test_generated_tokens_use_fresh_nonces() {
        let creds = Credentials::new("admin", "admin");
        let a = UsernameToken::generate(&creds, chrono::Duration::zero()).unwrap();
        let b = UsernameToken::generate(&creds, chrono::Duration::zero()).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_eq!(BASE64.decode(&a.nonce).unwrap().len(), NONCE_LEN);
        assert!(a.created.ends_with('Z'));
    }

    #[test]
    fn test_xml_escapes_username() {
        let creds = Credentials::new("a<b&c", "pw");
        let token = UsernameToken::with_nonce(&creds, b"n", "2026-01-01T00:00:00Z".into());
        let xml = token.to_xml();
        assert!(xml.contains("<wsse:Username>a&lt;b&amp;c</wsse:Username>"));
        assert!(xml.contains("PasswordDigest"));
    }
}

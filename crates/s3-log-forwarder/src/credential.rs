// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The log token prefixed to every line sent to the intake.

use std::fmt::Debug;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("token is empty")]
    Empty,

    #[error("token is not a canonical UUID")]
    NotCanonical,
}

/// A log token that parsed as a hyphenated `8-4-4-4-12` UUID.
///
/// The text is kept as-is so the intake sees exactly the configured
/// token, whatever its case.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn parse(token: &str) -> Result<Self, CredentialError> {
        if token.trim().is_empty() {
            return Err(CredentialError::Empty);
        }
        // Uuid::try_parse also takes the simple, braced and urn forms
        if token.len() != uuid::fmt::Hyphenated::LENGTH || Uuid::try_parse(token).is_err() {
            return Err(CredentialError::NotCanonical);
        }
        Ok(Self {
            token: token.to_string(),
        })
    }

    /// Builds one wire line: `"<token> <payload>\n"`.
    pub fn format_line(&self, payload: &str) -> String {
        let mut line = String::with_capacity(self.token.len() + payload.len() + 2);
        line.push_str(&self.token);
        line.push(' ');
        line.push_str(payload);
        line.push('\n');
        line
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "2bfbea1e-10c3-4419-bfa7-3a1ccb0c3d2b";

    #[test]
    fn test_parse_canonical_uuid() {
        let credential = Credential::parse(TOKEN).unwrap();
        assert_eq!(credential.format_line("x"), format!("{TOKEN} x\n"));
    }

    #[test]
    fn test_parse_keeps_uppercase_text() {
        let upper = TOKEN.to_uppercase();
        let credential = Credential::parse(&upper).unwrap();
        assert_eq!(credential.format_line("x"), format!("{upper} x\n"));
    }

    #[test]
    fn test_parse_rejects_other_uuid_forms() {
        let simple = TOKEN.replace('-', "");
        let braced = format!("{{{TOKEN}}}");
        let urn = format!("urn:uuid:{TOKEN}");
        for token in [simple.as_str(), braced.as_str(), urn.as_str()] {
            assert_eq!(
                Credential::parse(token),
                Err(CredentialError::NotCanonical),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Credential::parse(""), Err(CredentialError::Empty));
        assert_eq!(Credential::parse("   "), Err(CredentialError::Empty));
        assert_eq!(
            Credential::parse("not-a-token"),
            Err(CredentialError::NotCanonical)
        );
        assert_eq!(
            Credential::parse("2bfbea1e-10c3-4419-bfa7-3a1ccb0c3dzz"),
            Err(CredentialError::NotCanonical)
        );
    }

    #[test]
    fn test_format_line() {
        let credential = Credential::parse(TOKEN).unwrap();
        assert_eq!(
            credential.format_line("{\"a\":\"b\"}"),
            format!("{TOKEN} {{\"a\":\"b\"}}\n")
        );
        assert_eq!(credential.format_line(""), format!("{TOKEN} \n"));
    }

    #[test]
    fn test_debug_hides_token() {
        let credential = Credential::parse(TOKEN).unwrap();
        assert!(!format!("{:?}", credential).contains(TOKEN));
    }
}

//! Tenant claims embedded in access tokens.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::OrgRole;

/// The tenant slice of an access token's claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgClaims {
    #[serde(default)]
    pub org_id: Option<Uuid>,
    #[serde(default)]
    pub org_role: Option<OrgRole>,
    #[serde(default)]
    pub orgs: Vec<Uuid>,
}

/// Full claim set minted into access tokens by the local provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub org_id: Option<Uuid>,
    #[serde(default)]
    pub org_role: Option<OrgRole>,
    #[serde(default)]
    pub orgs: Vec<Uuid>,
}

/// Read the tenant claims out of a token's payload segment without
/// verifying the signature. Advisory only; the store stays authoritative.
///
/// Total: any malformed token decodes to empty claims rather than an error.
pub fn decode_claims(token: &str) -> OrgClaims {
    parse_payload(token).unwrap_or_default()
}

fn parse_payload(token: &str) -> Option<OrgClaims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decodes_full_claims() {
        let org_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let payload = format!(
            r#"{{"sub":"x","org_id":"{}","org_role":"admin","orgs":["{}","{}"]}}"#,
            org_id, org_id, other
        );

        let claims = decode_claims(&token_with_payload(&payload));
        assert_eq!(claims.org_id, Some(org_id));
        assert_eq!(claims.org_role, Some(OrgRole::Admin));
        assert_eq!(claims.orgs, vec![org_id, other]);
    }

    #[test]
    fn test_missing_tenant_claims_default() {
        let claims = decode_claims(&token_with_payload(r#"{"sub":"x","exp":123}"#));
        assert_eq!(claims, OrgClaims::default());
    }

    #[test]
    fn test_total_on_garbage() {
        for input in [
            "",
            "not-a-token",
            "a.b",
            "a.b.c.d",
            "a.!!!not-base64!!!.c",
            &token_with_payload("this is not json"),
            &token_with_payload(r#"{"org_id":"not-a-uuid"}"#),
            &token_with_payload(r#"{"org_role":"emperor"}"#),
        ] {
            assert_eq!(decode_claims(input), OrgClaims::default(), "input: {input:?}");
        }
    }
}

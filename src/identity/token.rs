use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// Read the `exp` claim of a JWT without verifying it.
///
/// Only used to learn when the backend will stop honoring a token; the
/// signature is the backend's business. Returns `None` for anything that
/// is not a three-part token with a numeric `exp`.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_jwt(claims: &str) -> String {
        let h = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let p = URL_SAFE_NO_PAD.encode(claims.as_bytes());
        format!("{}.{}.sig", h, p)
    }

    #[test]
    fn reads_exp_claim() {
        let t = fake_jwt(r#"{"user_id":"1","role":"admin","exp":1893456000}"#);
        let exp = jwt_expiry(&t).expect("exp");
        assert_eq!(exp.timestamp(), 1_893_456_000);
    }

    #[test]
    fn opaque_tokens_have_no_expiry() {
        assert!(jwt_expiry("T1").is_none());
        assert!(jwt_expiry("a.b").is_none());
        assert!(jwt_expiry("a.b.c.d").is_none());
        assert!(jwt_expiry(&fake_jwt(r#"{"sub":"1"}"#)).is_none());
        assert!(jwt_expiry("a.!!!.c").is_none());
    }
}

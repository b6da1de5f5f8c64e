use common::error::{AppError, Res};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Maximum age, in either direction, of a signed timestamp.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Checks a `t=<unix ts>,v1=<hex>[,v1=<hex>...]` header against the payload.
///
/// The signed message is `"{t}.{payload}"`, keyed with the webhook secret.
/// Any one of the `v1` entries may match; other schemes are skipped.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> Res<()> {
    if secret.is_empty() {
        return Err(AppError::Internal(
            "Webhook secret is not configured".to_string(),
        ));
    }

    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::Signature("Signature header has no timestamp".to_string()))?;
    let signed_at = timestamp
        .parse::<i64>()
        .map_err(|_| AppError::Signature("Signature timestamp is not a number".to_string()))?;
    if candidates.is_empty() {
        return Err(AppError::Signature(
            "Signature header has no v1 signature".to_string(),
        ));
    }
    if now.abs_diff(signed_at) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(AppError::Signature(
            "Signature timestamp outside the tolerance window".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Webhook secret is not a valid HMAC key".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = candidates
        .iter()
        .filter_map(|candidate| hex::decode(candidate).ok())
        .any(|candidate| mac.clone().verify_slice(&candidate).is_ok());

    if matched {
        Ok(())
    } else {
        Err(AppError::Signature(
            "No signature matches the payload".to_string(),
        ))
    }
}

/// Builds a header the way the gateway does.
#[cfg(test)]
pub(crate) fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

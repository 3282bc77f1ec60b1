//! Request signing as done by Slack: `v0=` + hex HMAC-SHA256 over
//! `v0:{timestamp}:{body}`, with the body re-encoded the way the platform encoded it.

use crate::error::VerifyError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";
/// Vendor-neutral spellings, accepted when the Slack headers are absent.
pub const GENERIC_TIMESTAMP_HEADER: &str = "X-Request-Timestamp";
pub const GENERIC_SIGNATURE_HEADER: &str = "X-Request-Signature";

const VERSION: &str = "v0";
const MAX_CLOCK_SKEW_SECS: u64 = 300;

/// Decoded `application/x-www-form-urlencoded` body, in wire order.
pub type FormPairs = Vec<(String, String)>;

pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Rejects timestamps more than five minutes from `now`. Unparseable timestamps
/// can never fall inside the window, so they are stale too.
pub fn check_freshness(now: i64, timestamp: &str) -> Result<(), VerifyError> {
    let ts: i64 = timestamp.parse().map_err(|_| VerifyError::StaleRequest)?;

    if now.abs_diff(ts) > MAX_CLOCK_SKEW_SECS {
        return Err(VerifyError::StaleRequest);
    }

    Ok(())
}

pub fn parse_form(raw_body: &[u8]) -> Result<FormPairs, VerifyError> {
    std::str::from_utf8(raw_body).map_err(|_| VerifyError::MalformedBody)?;

    // form_urlencoded swaps bad escapes for U+FFFD. Separators are ASCII, so
    // percent-decoding the whole body is valid UTF-8 iff every field is.
    let decoded = urlencoding::decode_binary(raw_body);
    std::str::from_utf8(&decoded).map_err(|_| VerifyError::MalformedBody)?;

    Ok(form_urlencoded::parse(raw_body).into_owned().collect())
}

/// Re-encodes form pairs byte-for-byte as the platform did before signing.
///
/// This is the legacy RFC 1738 form convention: spaces become `+` and `(`/`)`
/// stay literal, on top of the usual RFC 3986 unreserved set.
pub fn canonical_form(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(component: &str) -> String {
    // Every `%` in the output starts a full escape, so these replacements only
    // ever hit whole escapes.
    urlencoding::encode(component)
        .replace("%20", "+")
        .replace("%28", "(")
        .replace("%29", ")")
}

fn signing_mac(
    secret: &SecretString,
    timestamp: &str,
    body: &str,
) -> Result<HmacSha256, VerifyError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| VerifyError::InvalidSignature)?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body.as_bytes());
    Ok(mac)
}

pub fn compute_signature(
    secret: &SecretString,
    timestamp: &str,
    body: &str,
) -> Result<String, VerifyError> {
    let digest = signing_mac(secret, timestamp, body)?.finalize().into_bytes();
    Ok(format!("{}={}", VERSION, hex::encode(digest)))
}

/// Checks `signature` against the expected `v0=<hex>` value.
///
/// The digest comparison goes through `Mac::verify_slice`, which is constant-time.
/// Malformed headers simply fail.
pub fn verify_signature(
    secret: &SecretString,
    timestamp: &str,
    signature: &str,
    body: &str,
) -> bool {
    let Some(digest_hex) = signature
        .strip_prefix(VERSION)
        .and_then(|rest| rest.strip_prefix('='))
    else {
        return false;
    };

    // Expected form is lowercase hex; don't let hex::decode accept other spellings.
    if digest_hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }

    let Ok(digest) = hex::decode(digest_hex) else {
        return false;
    };

    let Ok(mac) = signing_mac(secret, timestamp, body) else {
        return false;
    };

    mac.verify_slice(&digest).is_ok()
}

/// Full inbound check: freshness first, then signature over the canonical body.
/// Returns the decoded form so callers don't parse it twice.
pub fn authenticate(
    secret: &SecretString,
    now: i64,
    timestamp: Option<&str>,
    signature: Option<&str>,
    raw_body: &[u8],
) -> Result<FormPairs, VerifyError> {
    let timestamp = timestamp.ok_or(VerifyError::MissingTimestamp)?;
    check_freshness(now, timestamp)?;

    let form = parse_form(raw_body)?;
    let signature = signature.ok_or(VerifyError::InvalidSignature)?;

    if !verify_signature(secret, timestamp, signature, &canonical_form(&form)) {
        return Err(VerifyError::InvalidSignature);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sample values from Slack's request-verification guide.
    const DOC_SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const DOC_TIMESTAMP: &str = "1531420618";
    const DOC_BODY: &str = "token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
    const DOC_SIGNATURE: &str =
        "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503";

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn pairs(items: &[(&str, &str)]) -> FormPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matches_platform_reference_signature() {
        let form = parse_form(DOC_BODY.as_bytes()).unwrap();
        let canonical = canonical_form(&form);
        assert_eq!(canonical, DOC_BODY);
        assert_eq!(
            compute_signature(&secret(DOC_SECRET), DOC_TIMESTAMP, &canonical).unwrap(),
            DOC_SIGNATURE
        );
    }

    #[test]
    fn legacy_encoding_keeps_parens_and_uses_plus_for_space() {
        let form = pairs(&[("payload", "{\"text\":\"a b (c) ~*é\"}")]);
        assert_eq!(
            canonical_form(&form),
            "payload=%7B%22text%22%3A%22a+b+(c)+~%2A%C3%A9%22%7D"
        );
    }

    #[test]
    fn parse_form_decodes_plus_and_escapes_in_order() {
        let form = parse_form(b"b=two+words&a=%28x%29&flag").unwrap();
        assert_eq!(form, pairs(&[("b", "two words"), ("a", "(x)"), ("flag", "")]));
    }

    #[test]
    fn parse_form_rejects_invalid_utf8() {
        assert_eq!(parse_form(b"payload=%FF%FE"), Err(VerifyError::MalformedBody));
        assert_eq!(parse_form(&[0xff, 0xfe]), Err(VerifyError::MalformedBody));
    }

    #[test]
    fn parse_form_keeps_wire_order_and_skips_empty_pairs() {
        let form = parse_form(b"z=1&&a=%E2%9C%93&z=2").unwrap();
        assert_eq!(form, pairs(&[("z", "1"), ("a", "\u{2713}"), ("z", "2")]));
    }

    #[test]
    fn parse_form_rejects_truncated_multibyte_escape() {
        assert_eq!(parse_form(b"a=%E2%9C&b=ok"), Err(VerifyError::MalformedBody));
    }

    #[test]
    fn any_key_length_signs_and_verifies() {
        for key in ["", "k", "x".repeat(200).as_str()] {
            let key = secret(key);
            let signature = compute_signature(&key, "1700000000", "a=b").unwrap();
            assert!(verify_signature(&key, "1700000000", &signature, "a=b"));
        }
    }

    #[test]
    fn freshness_window_is_five_minutes_either_way() {
        let now = 1_700_000_000;
        assert!(check_freshness(now, &(now - 300).to_string()).is_ok());
        assert!(check_freshness(now, &(now + 300).to_string()).is_ok());
        assert_eq!(
            check_freshness(now, &(now - 301).to_string()),
            Err(VerifyError::StaleRequest)
        );
        assert_eq!(
            check_freshness(now, &(now + 301).to_string()),
            Err(VerifyError::StaleRequest)
        );
        assert_eq!(check_freshness(now, "soon"), Err(VerifyError::StaleRequest));
    }

    #[test]
    fn stale_request_is_rejected_even_with_valid_signature() {
        let key = secret("s3cr3t");
        let now = 1_700_000_000;
        let timestamp = (now - 301).to_string();
        let body = "payload=%7B%7D";
        let signature = compute_signature(&key, &timestamp, body).unwrap();

        assert_eq!(
            authenticate(
                &key,
                now,
                Some(timestamp.as_str()),
                Some(signature.as_str()),
                body.as_bytes()
            ),
            Err(VerifyError::StaleRequest)
        );
    }

    #[test]
    fn signature_round_trips_over_canonical_body() {
        let key = secret("s3cr3t");
        let now = 1_700_000_000;
        let timestamp = now.to_string();
        let body = canonical_form(&pairs(&[("payload", "{\"type\":\"shortcut\"}")]));
        let signature = compute_signature(&key, &timestamp, &body).unwrap();

        let form = authenticate(
            &key,
            now,
            Some(timestamp.as_str()),
            Some(signature.as_str()),
            body.as_bytes(),
        )
        .unwrap();
        assert_eq!(form, pairs(&[("payload", "{\"type\":\"shortcut\"}")]));
    }

    #[test]
    fn differently_escaped_body_still_verifies_after_canonicalization() {
        let key = secret("s3cr3t");
        let now = 1_700_000_000;
        let timestamp = now.to_string();
        let signature = compute_signature(&key, &timestamp, "text=a+(b)").unwrap();

        assert!(authenticate(
            &key,
            now,
            Some(timestamp.as_str()),
            Some(signature.as_str()),
            b"text=a%20%28b%29"
        )
        .is_ok());
    }

    #[test]
    fn any_single_input_change_alters_the_signature() {
        let key = secret("s3cr3t");
        let base = compute_signature(&key, "1700000000", "payload=abc").unwrap();

        assert_ne!(base, compute_signature(&key, "1700000000", "payload=abd").unwrap());
        assert_ne!(base, compute_signature(&key, "1700000001", "payload=abc").unwrap());
        let other_key = secret("s3cr3u");
        assert_ne!(base, compute_signature(&other_key, "1700000000", "payload=abc").unwrap());
    }

    #[test]
    fn malformed_signature_headers_fail_without_panicking() {
        let key = secret("s3cr3t");
        let good = compute_signature(&key, "1700000000", "a=b").unwrap();

        for header in [
            "",
            "v0=",
            "v0",
            "v1=00",
            "v0=zz",
            "v0=abc",
            &good[3..],
            good.to_uppercase().as_str(),
            &good[..good.len() - 2],
        ] {
            assert!(
                !verify_signature(&key, "1700000000", header, "a=b"),
                "header {header:?} should not verify"
            );
        }
        assert!(verify_signature(&key, "1700000000", &good, "a=b"));
    }

    #[test]
    fn missing_headers_map_to_distinct_errors() {
        let key = secret("s3cr3t");
        let now = 1_700_000_000;
        let timestamp = now.to_string();

        assert_eq!(
            authenticate(&key, now, None, Some("v0=00"), b"a=b"),
            Err(VerifyError::MissingTimestamp)
        );
        assert_eq!(
            authenticate(&key, now, Some(timestamp.as_str()), None, b"a=b"),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn wrong_secret_is_unauthenticated() {
        let now = 1_700_000_000;
        let timestamp = now.to_string();
        let signature = compute_signature(&secret("other"), &timestamp, "a=b").unwrap();

        assert_eq!(
            authenticate(
                &secret("s3cr3t"),
                now,
                Some(timestamp.as_str()),
                Some(signature.as_str()),
                b"a=b"
            ),
            Err(VerifyError::InvalidSignature)
        );
    }
}

//! Structural and semantic policy validation.
//!
//! The loader hands this module a parsed JSON tree; validation walks it
//! field by field, collecting **every** violation (wrong type, missing
//! field, out-of-range value) instead of stopping at the first. Only a
//! tree with zero violations becomes a [`PolicyConfig`].

use serde_json::Value;
use tollgate_core::{ChainId, TokenAddress};

use crate::error::FieldError;
use crate::types::{CapRule, Caps, PolicyConfig, TokenEntry};

/// Maximum permitted slippage cap (100% in basis points).
const SLIPPAGE_BPS_UPPER_BOUND: u64 = 10_000;

/// Maximum sane token decimals.
const DECIMALS_UPPER_BOUND: u64 = 36;

/// Build a validated [`PolicyConfig`] from a parsed JSON tree.
///
/// # Errors
///
/// Returns the complete list of validation failures if any field is
/// missing, mistyped, or out of range.
pub fn build(value: &Value) -> Result<PolicyConfig, Vec<FieldError>> {
    let mut errors = Vec::new();

    let Some(root) = value.as_object() else {
        return Err(vec![FieldError::new("<root>", "policy must be a JSON object")]);
    };

    let version = require_u64(root, "version", &mut errors).and_then(|v| {
        if v == 0 {
            errors.push(FieldError::new("version", "must be at least 1"));
            None
        } else {
            u32::try_from(v).map_or_else(
                |_| {
                    errors.push(FieldError::new("version", "value out of range"));
                    None
                },
                Some,
            )
        }
    });

    let chain_allowlist = validate_chains(root, &mut errors);
    let token_allowlist = validate_tokens(root, &mut errors);
    let merchant_allowlist_domains = validate_string_list(
        root,
        "merchantAllowlistDomains",
        |s| !s.trim().is_empty(),
        "must be a non-empty domain",
        &mut errors,
    );
    let recipient_allowlist = validate_string_list(
        root,
        "recipientAllowlist",
        is_hex_address,
        "must be a 0x-prefixed 40-hex-character address",
        &mut errors,
    );
    let caps = validate_caps(root, &mut errors);

    let slippage_cap_bps = require_u64(root, "slippageCapBps", &mut errors).and_then(|v| {
        if v > SLIPPAGE_BPS_UPPER_BOUND {
            errors.push(FieldError::new(
                "slippageCapBps",
                format!("must be at most {SLIPPAGE_BPS_UPPER_BOUND}"),
            ));
            None
        } else {
            u32::try_from(v).ok()
        }
    });

    let target_stable_ratio = require_ratio(root, "targetStableRatio", &mut errors);
    let max_exposure_per_asset = require_ratio(root, "maxExposurePerAsset", &mut errors);

    let allow_all_when_empty = match root.get("allowAllWhenEmpty") {
        None => Some(true),
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push(FieldError::new("allowAllWhenEmpty", "must be a boolean"));
            None
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // All collectors succeeded if no errors were recorded.
    match (
        version,
        chain_allowlist,
        token_allowlist,
        merchant_allowlist_domains,
        recipient_allowlist,
        caps,
        slippage_cap_bps,
        target_stable_ratio,
        max_exposure_per_asset,
        allow_all_when_empty,
    ) {
        (
            Some(version),
            Some(chain_allowlist),
            Some(token_allowlist),
            Some(merchant_allowlist_domains),
            Some(recipient_allowlist),
            Some(caps),
            Some(slippage_cap_bps),
            Some(target_stable_ratio),
            Some(max_exposure_per_asset),
            Some(allow_all_when_empty),
        ) => Ok(PolicyConfig {
            version,
            chain_allowlist,
            token_allowlist,
            merchant_allowlist_domains,
            recipient_allowlist,
            caps,
            slippage_cap_bps,
            target_stable_ratio,
            max_exposure_per_asset,
            allow_all_when_empty,
        }),
        _ => Err(vec![FieldError::new(
            "<root>",
            "internal validation inconsistency",
        )]),
    }
}

fn validate_chains(
    root: &serde_json::Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<ChainId>> {
    let Some(value) = root.get("chainAllowlist") else {
        errors.push(FieldError::new("chainAllowlist", "missing required field"));
        return None;
    };
    let Some(items) = value.as_array() else {
        errors.push(FieldError::new("chainAllowlist", "must be an array of chain ids"));
        return None;
    };
    let mut chains = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        if let Some(id) = item.as_u64() {
            chains.push(ChainId(id));
        } else {
            errors.push(FieldError::new(
                format!("chainAllowlist[{i}]"),
                "must be a non-negative integer chain id",
            ));
            ok = false;
        }
    }
    ok.then_some(chains)
}

fn validate_tokens(
    root: &serde_json::Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<TokenEntry>> {
    let Some(value) = root.get("tokenAllowlist") else {
        errors.push(FieldError::new("tokenAllowlist", "missing required field"));
        return None;
    };
    let Some(items) = value.as_array() else {
        errors.push(FieldError::new("tokenAllowlist", "must be an array of token entries"));
        return None;
    };
    let mut tokens = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        let path = format!("tokenAllowlist[{i}]");
        let Some(obj) = item.as_object() else {
            errors.push(FieldError::new(path, "must be an object"));
            ok = false;
            continue;
        };

        let symbol = match obj.get("symbol").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => Some(s.to_string()),
            _ => {
                errors.push(FieldError::new(
                    format!("{path}.symbol"),
                    "must be a non-empty string",
                ));
                None
            },
        };
        let address = match obj.get("address").and_then(Value::as_str) {
            Some(a) if is_hex_address(a) => Some(TokenAddress::new(a)),
            _ => {
                errors.push(FieldError::new(
                    format!("{path}.address"),
                    "must be a 0x-prefixed 40-hex-character address",
                ));
                None
            },
        };
        let decimals = match obj.get("decimals").and_then(Value::as_u64) {
            Some(d) if d <= DECIMALS_UPPER_BOUND => u8::try_from(d).ok(),
            _ => {
                errors.push(FieldError::new(
                    format!("{path}.decimals"),
                    format!("must be an integer between 0 and {DECIMALS_UPPER_BOUND}"),
                ));
                None
            },
        };

        match (symbol, address, decimals) {
            (Some(symbol), Some(address), Some(decimals)) => tokens.push(TokenEntry {
                symbol,
                address,
                decimals,
            }),
            _ => ok = false,
        }
    }
    ok.then_some(tokens)
}

fn validate_string_list(
    root: &serde_json::Map<String, Value>,
    field: &str,
    valid: impl Fn(&str) -> bool,
    rule: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Vec<String>> {
    let Some(value) = root.get(field) else {
        errors.push(FieldError::new(field, "missing required field"));
        return None;
    };
    let Some(items) = value.as_array() else {
        errors.push(FieldError::new(field, "must be an array of strings"));
        return None;
    };
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) if valid(s) => out.push(s.to_string()),
            _ => {
                errors.push(FieldError::new(format!("{field}[{i}]"), rule));
                ok = false;
            },
        }
    }
    ok.then_some(out)
}

fn validate_caps(
    root: &serde_json::Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<Caps> {
    let Some(value) = root.get("caps") else {
        errors.push(FieldError::new("caps", "missing required field"));
        return None;
    };
    let Some(obj) = value.as_object() else {
        errors.push(FieldError::new("caps", "must be an object"));
        return None;
    };
    let per_payment = validate_cap_rule(obj, "caps.perPayment", "perPayment", errors);
    let daily = validate_cap_rule(obj, "caps.daily", "daily", errors);
    match (per_payment, daily) {
        (Some(per_payment), Some(daily)) => Some(Caps { per_payment, daily }),
        _ => None,
    }
}

fn validate_cap_rule(
    caps: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<CapRule> {
    let Some(value) = caps.get(key) else {
        errors.push(FieldError::new(path, "missing required field"));
        return None;
    };
    let Some(obj) = value.as_object() else {
        errors.push(FieldError::new(path, "must be an object"));
        return None;
    };

    let enabled = match obj.get("enabled") {
        Some(Value::Bool(b)) => Some(*b),
        _ => {
            errors.push(FieldError::new(format!("{path}.enabled"), "must be a boolean"));
            None
        },
    };
    let max_usd = match obj.get("maxUsd").and_then(Value::as_f64) {
        Some(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            errors.push(FieldError::new(
                format!("{path}.maxUsd"),
                "must be a finite non-negative number",
            ));
            None
        },
    };

    let (enabled, max_usd) = (enabled?, max_usd?);
    if enabled && max_usd <= 0.0 {
        errors.push(FieldError::new(
            format!("{path}.maxUsd"),
            "must be positive when the cap is enabled",
        ));
        return None;
    }
    Some(CapRule { enabled, max_usd })
}

fn require_u64(
    root: &serde_json::Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<u64> {
    match root.get(field) {
        None => {
            errors.push(FieldError::new(field, "missing required field"));
            None
        },
        Some(value) => value.as_u64().or_else(|| {
            errors.push(FieldError::new(field, "must be a non-negative integer"));
            None
        }),
    }
}

fn require_ratio(
    root: &serde_json::Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match root.get(field).and_then(Value::as_f64) {
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Some(v),
        Some(_) => {
            errors.push(FieldError::new(field, "must be between 0.0 and 1.0"));
            None
        },
        None => {
            errors.push(FieldError::new(
                field,
                "missing required field or not a number",
            ));
            None
        },
    }
}

fn is_hex_address(s: &str) -> bool {
    let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_policy() -> Value {
        json!({
            "version": 1,
            "chainAllowlist": [8453, 1],
            "tokenAllowlist": [
                {"symbol": "USDC", "address": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", "decimals": 6}
            ],
            "merchantAllowlistDomains": ["api.trusted.com"],
            "recipientAllowlist": ["0x1111111111111111111111111111111111111111"],
            "caps": {
                "perPayment": {"enabled": true, "maxUsd": 100.0},
                "daily": {"enabled": true, "maxUsd": 5000.0}
            },
            "slippageCapBps": 50,
            "targetStableRatio": 0.8,
            "maxExposurePerAsset": 0.5
        })
    }

    #[test]
    fn test_valid_policy_builds() {
        let config = build(&valid_policy()).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.chain_allowlist.len(), 2);
        assert_eq!(config.token_allowlist[0].symbol, "USDC");
        assert!(config.allow_all_when_empty);
    }

    #[test]
    fn test_all_violations_reported_at_once() {
        let mut policy = valid_policy();
        policy["version"] = json!("one");
        policy["targetStableRatio"] = json!(1.5);
        policy["caps"]["daily"]["maxUsd"] = json!(-10.0);

        let errors = build(&policy).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"version"));
        assert!(fields.contains(&"targetStableRatio"));
        assert!(fields.contains(&"caps.daily.maxUsd"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_missing_field_reported_by_path() {
        let mut policy = valid_policy();
        policy.as_object_mut().unwrap().remove("caps");
        let errors = build(&policy).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "caps");
        assert!(errors[0].message.contains("missing"));
    }

    #[test]
    fn test_bad_token_entry_located_by_index() {
        let mut policy = valid_policy();
        policy["tokenAllowlist"] = json!([
            {"symbol": "", "address": "not-an-address", "decimals": 99}
        ]);
        let errors = build(&policy).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"tokenAllowlist[0].symbol"));
        assert!(fields.contains(&"tokenAllowlist[0].address"));
        assert!(fields.contains(&"tokenAllowlist[0].decimals"));
    }

    #[test]
    fn test_enabled_cap_requires_positive_limit() {
        let mut policy = valid_policy();
        policy["caps"]["perPayment"] = json!({"enabled": true, "maxUsd": 0.0});
        let errors = build(&policy).unwrap_err();
        assert_eq!(errors[0].field, "caps.perPayment.maxUsd");
    }

    #[test]
    fn test_disabled_cap_allows_zero_limit() {
        let mut policy = valid_policy();
        policy["caps"]["perPayment"] = json!({"enabled": false, "maxUsd": 0.0});
        assert!(build(&policy).is_ok());
    }

    #[test]
    fn test_non_object_root_rejected() {
        let errors = build(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors[0].field, "<root>");
    }

    #[test]
    fn test_hex_address_rules() {
        assert!(is_hex_address("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"));
        assert!(!is_hex_address("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"));
        assert!(!is_hex_address("0x1234"));
        assert!(!is_hex_address("0xZZ3589fCD6eDb6E08f4c7C32D4f71b54bdA02913"));
    }
}

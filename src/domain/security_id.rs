//! Equity code parsing and exchange suffix resolution.
//!
//! Codes are six ASCII digits. Shenzhen codes start with `0` (`.XSHE`),
//! Shanghai codes with `6` (`.XSHG`).

use crate::domain::error::SmacrossError;
use std::collections::HashSet;

pub const SHENZHEN_SUFFIX: &str = ".XSHE";
pub const SHANGHAI_SUFFIX: &str = ".XSHG";
const CODE_LEN: usize = 6;

/// Map a bare equity code to the market-data security id.
pub fn to_security_id(code: &str) -> Result<String, SmacrossError> {
    let code = code.trim();
    if code.ends_with(SHENZHEN_SUFFIX) || code.ends_with(SHANGHAI_SUFFIX) {
        return Ok(code.to_string());
    }

    if code.is_empty() {
        return Err(SmacrossError::InvalidSecurityId {
            id: String::new(),
            reason: "empty code".into(),
        });
    }
    if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SmacrossError::InvalidSecurityId {
            id: code.to_string(),
            reason: format!("expected {} digits", CODE_LEN),
        });
    }

    match code.as_bytes()[0] {
        b'0' => Ok(format!("{}{}", code, SHENZHEN_SUFFIX)),
        b'6' => Ok(format!("{}{}", code, SHANGHAI_SUFFIX)),
        _ => Err(SmacrossError::InvalidSecurityId {
            id: code.to_string(),
            reason: "expected a code starting with 0 or 6".into(),
        }),
    }
}

/// Split a comma separated code list, rejecting empty tokens and duplicates.
pub fn parse_ids(input: &str) -> Result<Vec<String>, SmacrossError> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SmacrossError::InvalidSecurityId {
                id: input.to_string(),
                reason: "empty token in id list".into(),
            });
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(SmacrossError::InvalidSecurityId {
                id: trimmed.to_string(),
                reason: "duplicate id".into(),
            });
        }
        ids.push(trimmed.to_string());
    }

    Ok(ids)
}

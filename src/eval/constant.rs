//! Tagged-constant decode/encode (§4.6.3, §9.6).
//!
//! `ConstantData::value` keeps the prefix (`"UINT:30"`) rather than a typed
//! numeric so base and formatting survive a round trip (§9.6). The host
//! crate's native-numeric crates (`num-bigint`, `num-traits`) were dropped
//! (`SPEC_FULL.md` §0): values here are native `i64`/`u64`/`f64`, so a
//! `STRING:` constant longer than 8 bytes or a `BIN:`/`HEX:`/`OCT:` literal
//! wider than 64 bits cannot be read back as a definite integer -- `get_value`
//! et al. return `None` rather than silently truncating, and callers treat
//! that the same as an `invalidValue` operand (§4.6.1). This is a deliberate,
//! documented narrowing from the 32-byte limit §4.6.3 names; see `DESIGN.md`.

use crate::node::{ConstType, ConstantData};

/// Strip the `"TAG:"` prefix `ConstantData::value` always carries, leaving
/// the digits `get_value`/`to_binary` actually parse.
fn body(s: &str) -> &str {
    s.split_once(':').map_or(s, |(_, rest)| rest).trim()
}

fn strip_x_z(s: &str) -> Option<&str> {
    if s.contains(['x', 'X', 'z', 'Z']) {
        None
    } else {
        Some(s)
    }
}

/// `get_value` (§4.6.2): signed 64-bit reading of a constant.
#[must_use]
pub fn get_value(c: &ConstantData) -> Option<i64> {
    let body = body(&c.value);
    match c.const_type? {
        ConstType::Bin => i64::from_str_radix(strip_x_z(body)?, 2).ok(),
        ConstType::Dec => body.parse::<i64>().ok(),
        ConstType::Hex => u64::from_str_radix(strip_x_z(body)?, 16).ok().map(|v| v as i64),
        ConstType::Oct => u64::from_str_radix(strip_x_z(body)?, 8).ok().map(|v| v as i64),
        ConstType::Int => body.parse::<i64>().ok(),
        ConstType::UInt => body.parse::<u64>().ok().map(|v| v as i64),
        ConstType::Scalar => match strip_x_z(body)? {
            "0" => Some(0),
            "1" => Some(1),
            _ => None,
        },
        ConstType::String => string_to_u64(body).map(|v| v as i64),
        ConstType::Real => body.parse::<f64>().ok().map(|v| v as i64),
    }
}

/// `get_uvalue` (§4.6.2): unsigned reading, same bit pattern as `get_value`.
#[must_use]
pub fn get_uvalue(c: &ConstantData) -> Option<u64> {
    get_value(c).map(|v| v as u64)
}

/// `get_double` (§4.6.2).
#[must_use]
pub fn get_double(c: &ConstantData) -> Option<f64> {
    if c.const_type == Some(ConstType::Real) {
        body(&c.value).parse::<f64>().ok()
    } else {
        get_value(c).map(|v| v as f64)
    }
}

fn string_to_u64(s: &str) -> Option<u64> {
    if s.len() > 8 {
        return None;
    }
    let mut v = 0u64;
    for b in s.bytes() {
        v = (v << 8) | u64::from(b);
    }
    Some(v)
}

/// `toBinary` (§4.6.2): canonical zero/one string at the constant's declared
/// width (natural 64-bit width when unsized).
#[must_use]
pub fn to_binary(c: &ConstantData) -> String {
    if c.const_type == Some(ConstType::Bin) {
        return pad_to_width(body(&c.value), c.size);
    }
    match get_uvalue(c) {
        Some(v) => {
            let width = if c.size > 0 { c.size as u32 } else { (64 - v.leading_zeros()).max(1) };
            binary_of(v, width)
        }
        None => String::new(),
    }
}

fn binary_of(v: u64, width: u32) -> String {
    let width = width.min(64);
    let mut s = format!("{v:0width$b}", width = width as usize);
    if s.len() > width as usize {
        let start = s.len() - width as usize;
        s = s[start..].to_owned();
    }
    s
}

fn pad_to_width(body: &str, size: i64) -> String {
    if size <= 0 || body.len() as i64 >= size {
        return body.to_owned();
    }
    let mut out = "0".repeat((size as usize) - body.len());
    out.push_str(body);
    out
}

/// Build a tagged `UINT:` constant (§4.6.3).
#[must_use]
pub fn make_uint(value: u64, size: i64) -> ConstantData {
    ConstantData {
        value: format!("UINT:{value}"),
        const_type: Some(ConstType::UInt),
        size,
        ref_typespec: None,
    }
}

/// Build a tagged `INT:` constant (§4.6.3).
#[must_use]
pub fn make_int(value: i64, size: i64) -> ConstantData {
    ConstantData {
        value: format!("INT:{value}"),
        const_type: Some(ConstType::Int),
        size,
        ref_typespec: None,
    }
}

/// Build a tagged `REAL:` constant.
#[must_use]
pub fn make_real(value: f64) -> ConstantData {
    ConstantData {
        value: format!("REAL:{value}"),
        const_type: Some(ConstType::Real),
        size: -1,
        ref_typespec: None,
    }
}

/// Build a single-bit `BIN:` constant (used for comparison results, §4.6.4).
#[must_use]
pub fn make_bool(value: bool) -> ConstantData {
    ConstantData {
        value: format!("BIN:{}", i32::from(value)),
        const_type: Some(ConstType::Bin),
        size: 1,
        ref_typespec: None,
    }
}

/// Whether the constant carries no declared width (§4.6.3, "unsized").
#[must_use]
pub fn is_unsized(c: &ConstantData) -> bool {
    c.size == -1
}

/// Resize an unsized single-bit-fill constant against a neighbor's width
/// (§4.6.3): `1` becomes an all-ones mask of `width` bits, `0` stays `0` but
/// is stamped with `width`.
#[must_use]
pub fn resize_unsized(c: &ConstantData, width: i64) -> ConstantData {
    if !is_unsized(c) || width <= 0 {
        return c.clone();
    }
    match get_uvalue(c) {
        Some(0) => ConstantData {
            value: "UINT:0".to_owned(),
            const_type: Some(ConstType::UInt),
            size: width,
            ref_typespec: c.ref_typespec,
        },
        Some(_) => {
            let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
            ConstantData {
                value: format!("UINT:{mask}"),
                const_type: Some(ConstType::UInt),
                size: width,
                ref_typespec: c.ref_typespec,
            }
        }
        None => c.clone(),
    }
}

/// Whether any operand reading forces a signed result (§4.6.4: "if any
/// operand is `INT`/`DEC`/`REAL`/`STRING` the result is signed").
#[must_use]
pub fn forces_signed(c: &ConstantData) -> bool {
    matches!(c.const_type, Some(ConstType::Int | ConstType::Dec | ConstType::Real | ConstType::String))
}

//! Minimal big-endian modular bignum arithmetic backing the `mock` engine's
//! scalar/point operations (§4.7).
//!
//! The mock backend treats both a curve's scalar field and its point group
//! as the same thing: `(Z/order)+` under addition, with "scalar times
//! point" implemented as multiplication mod the curve order. This has a
//! trivial discrete log and is not a stand-in for real curve arithmetic —
//! consistent with the rest of this module's HMAC/hash-based non-group-law
//! constructions, it exists only to give every caller of [`crate::Engine`]'s
//! arithmetic methods a self-consistent backend to exercise against.
//!
//! All functions operate on big-endian byte buffers already reduced to a
//! fixed width (a curve's order length) except where noted.

use cbmpc_types::{Error, Result};

fn pad_to(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len.saturating_sub(bytes.len())];
    out.extend_from_slice(bytes);
    out
}

/// `a >= b`, equal-length big-endian comparison.
fn ge(a: &[u8], b: &[u8]) -> bool {
    for (x, y) in a.iter().zip(b.iter()) {
        if x != y {
            return x > y;
        }
    }
    true
}

/// `a - b` for equal-length big-endian `a >= b`.
fn sub_equal_len(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len()];
    let mut borrow = 0i16;
    for i in (0..a.len()).rev() {
        let mut diff = a[i] as i16 - b[i] as i16 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out[i] = diff as u8;
    }
    out
}

/// `a + b` for equal-length big-endian operands, one byte wider than the
/// input to hold the carry.
fn add_equal_len(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + 1];
    let mut carry = 0u16;
    for i in (0..a.len()).rev() {
        let sum = a[i] as u16 + b[i] as u16 + carry;
        out[i + 1] = (sum & 0xff) as u8;
        carry = sum >> 8;
    }
    out[0] = carry as u8;
    out
}

/// Shifts `buf` left by one bit, shifting `bit` into the low end. Callers
/// must keep enough headroom bytes that the dropped top bit is always zero.
fn shift_left_one_with_bit(buf: &mut [u8], bit: u8) {
    let mut carry = bit;
    for b in buf.iter_mut().rev() {
        let next_carry = (*b >> 7) & 1;
        *b = (*b << 1) | carry;
        carry = next_carry;
    }
}

/// Reduces an arbitrary-length big-endian integer mod `m`, returning a
/// buffer exactly `m.len()` bytes wide.
pub(crate) fn reduce_to_width_mod(a: &[u8], m: &[u8]) -> Vec<u8> {
    let width = m.len();
    let mpad = pad_to(m, width + 1);
    let mut rem = vec![0u8; width + 1];
    for &byte in a {
        for bit_index in (0..8).rev() {
            let bit = (byte >> bit_index) & 1;
            shift_left_one_with_bit(&mut rem, bit);
            if ge(&rem, &mpad) {
                rem = sub_equal_len(&rem, &mpad);
            }
        }
    }
    rem[1..].to_vec()
}

/// `(a + b) mod m` for `a, b < m`, all the same width as `m`.
pub(crate) fn add_mod(a: &[u8], b: &[u8], m: &[u8]) -> Vec<u8> {
    let sum = add_equal_len(a, b);
    let mpad = pad_to(m, m.len() + 1);
    if ge(&sum, &mpad) {
        sub_equal_len(&sum, &mpad)[1..].to_vec()
    } else {
        sum[1..].to_vec()
    }
}

/// `(a - b) mod m` for `a, b < m`.
pub(crate) fn sub_mod(a: &[u8], b: &[u8], m: &[u8]) -> Vec<u8> {
    if ge(a, b) {
        sub_equal_len(a, b)
    } else {
        let diff = sub_equal_len(b, a);
        sub_equal_len(m, &diff)
    }
}

/// Schoolbook big-endian multiply, producing an `a.len() + b.len()` byte
/// product.
fn mul_wide(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut result = vec![0u32; a.len() + b.len()];
    for (i, &av) in a.iter().enumerate().rev() {
        let mut carry: u32 = 0;
        for (j, &bv) in b.iter().enumerate().rev() {
            let idx = i + j + 1;
            let prod = av as u32 * bv as u32 + result[idx] + carry;
            result[idx] = prod & 0xff;
            carry = prod >> 8;
        }
        let mut k = i;
        while carry > 0 {
            let prod = result[k] + carry;
            result[k] = prod & 0xff;
            carry = prod >> 8;
            if k == 0 {
                break;
            }
            k -= 1;
        }
    }
    result.into_iter().map(|x| x as u8).collect()
}

/// `(a * b) mod m` for `a, b < m`.
pub(crate) fn mul_mod(a: &[u8], b: &[u8], m: &[u8]) -> Vec<u8> {
    let wide = mul_wide(a, b);
    reduce_to_width_mod(&wide, m)
}

/// `a - small` for a small non-negative constant, big-endian, same width.
fn sub_small(a: &[u8], small: u8) -> Vec<u8> {
    let mut out = a.to_vec();
    let mut borrow = small as i16;
    for byte in out.iter_mut().rev() {
        let mut diff = *byte as i16 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        *byte = diff as u8;
        if borrow == 0 {
            break;
        }
    }
    out
}

/// `base^exp mod m` via square-and-multiply.
fn pow_mod(base: &[u8], exp: &[u8], m: &[u8]) -> Vec<u8> {
    let width = m.len();
    let mut result = vec![0u8; width];
    if let Some(last) = result.last_mut() {
        *last = 1;
    }
    let base = reduce_to_width_mod(base, m);
    for &byte in exp {
        for bit_index in (0..8).rev() {
            result = mul_mod(&result, &result, m);
            if (byte >> bit_index) & 1 == 1 {
                result = mul_mod(&result, &base, m);
            }
        }
    }
    result
}

/// Modular inverse via Fermat's little theorem (`a^(m-2) mod m`) — valid
/// because every curve order this workspace knows about is prime. Errors on
/// a zero input, which has no inverse.
pub(crate) fn inv_mod(a: &[u8], m: &[u8]) -> Result<Vec<u8>> {
    if a.iter().all(|b| *b == 0) {
        return Err(Error::InvalidArgument("cannot invert zero".into()));
    }
    let exp = sub_small(m, 2);
    Ok(pow_mod(a, &exp, m))
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: [u8; 2] = [0, 251]; // a small prime, 251

    #[test]
    fn test_add_mod_wraps() {
        let a = [0, 250];
        let b = [0, 2];
        assert_eq!(add_mod(&a, &b, &M), vec![0, 1]);
    }

    #[test]
    fn test_sub_mod_wraps() {
        let a = [0, 1];
        let b = [0, 2];
        assert_eq!(sub_mod(&a, &b, &M), vec![0, 250]);
    }

    #[test]
    fn test_mul_mod() {
        let a = [0, 20];
        let b = [0, 20];
        // 400 mod 251 = 149
        assert_eq!(mul_mod(&a, &b, &M), vec![0, 149]);
    }

    #[test]
    fn test_reduce_to_width_mod_wide_input() {
        let wide = [1, 0, 0]; // 65536
        // 65536 mod 251 = 65536 - 261*251 = 65536 - 65511 = 25
        assert_eq!(reduce_to_width_mod(&wide, &M), vec![0, 25]);
    }

    #[test]
    fn test_inv_mod_round_trips() {
        let a = [0, 17];
        let inv = inv_mod(&a, &M).expect("17 is invertible mod 251");
        assert_eq!(mul_mod(&a, &inv, &M), vec![0, 1]);
    }

    #[test]
    fn test_inv_mod_rejects_zero() {
        let zero = [0, 0];
        assert!(inv_mod(&zero, &M).is_err());
    }
}

//! Integer arithmetic as the C reference interpreter performs it on a
//! 64-bit host: two's complement wrapping, truncating division, and
//! zero instead of a fault for `/ 0` and `% 0`.

use super::BinaryOp;

pub(crate) fn apply(lhs: i64, op: BinaryOp, rhs: i64) -> i64 {
    match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div => divide(lhs, rhs),
        BinaryOp::Rem => remainder(lhs, rhs),
        BinaryOp::Pow => power(lhs, rhs),
        BinaryOp::BitAnd => lhs & rhs,
        BinaryOp::BitOr => lhs | rhs,
        BinaryOp::BitXor => lhs ^ rhs,
        BinaryOp::Shl => lhs.wrapping_shl(shift_count(rhs)),
        BinaryOp::Shr => lhs.wrapping_shr(shift_count(rhs)),
        BinaryOp::UShr => ((lhs as u64) >> shift_count(rhs)) as i64,
    }
}

/// Truncates toward zero: `5 / -2 == -2`.
pub fn divide(lhs: i64, rhs: i64) -> i64 {
    if rhs == 0 {
        return 0;
    }
    lhs.wrapping_div(rhs)
}

/// Sign follows the dividend: `-7 % 2 == -1`, `7 % -2 == 1`.
pub fn remainder(lhs: i64, rhs: i64) -> i64 {
    if rhs == 0 {
        return 0;
    }
    lhs.wrapping_rem(rhs)
}

/// `x ** 0 == 1`. A negative exponent gives the truncated real result,
/// which is only non-zero for bases 1 and -1.
pub fn power(base: i64, exponent: i64) -> i64 {
    if exponent == 0 {
        return 1;
    }
    if exponent < 0 {
        return match base {
            1 => 1,
            -1 if exponent % 2 == 0 => 1,
            -1 => -1,
            _ => 0,
        };
    }
    let mut result: i64 = 1;
    let mut factor = base;
    let mut remaining = exponent as u64;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.wrapping_mul(factor);
        }
        factor = factor.wrapping_mul(factor);
        remaining >>= 1;
    }
    result
}

// Counts wrap modulo 64 like the x86-64 shift instructions.
fn shift_count(rhs: i64) -> u32 {
    (rhs & 63) as u32
}

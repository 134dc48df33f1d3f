//! Arithmetic over GF(2⁸) with the ECC200 field polynomial.
//!
//! The field is generated by `p(x) = x⁸ + x⁵ + x³ + x² + 1` (0x12D). Two
//! tables map between polynomial and exponential representation:
//! `ALPHA_TO[i] = α^i` and `EXP_OF[a] = log_α(a)`. Both are built at compile
//! time and shared read-only. `ALPHA_TO[255] = 0` and `EXP_OF[0] = 255` are
//! sentinels: zero has no logarithm, and exponent arithmetic is always
//! reduced mod 255 before lookup.

/// ECC200 field polynomial, bit 8 included.
const POLY: u16 = 0x12D;

const fn build_alpha_to() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut v: u16 = 1;
    let mut i = 0;
    while i < 255 {
        table[i] = v as u8;
        v <<= 1;
        if v & 0x100 != 0 {
            v ^= POLY;
        }
        i += 1;
    }
    table
}

const fn build_exp_of(alpha_to: &[u8; 256]) -> [u8; 256] {
    let mut table = [0u8; 256];
    table[0] = 255;
    let mut i = 0;
    while i < 255 {
        table[alpha_to[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// `ALPHA_TO[i] = α^i` for `i ∈ [0, 254]`; `ALPHA_TO[255] = 0`.
pub static ALPHA_TO: [u8; 256] = build_alpha_to();

/// `EXP_OF[α^i] = i`; `EXP_OF[0] = 255` (sentinel).
pub static EXP_OF: [u8; 256] = {
    const ALPHA: [u8; 256] = build_alpha_to();
    build_exp_of(&ALPHA)
};

/// Field addition (= subtraction).
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    ALPHA_TO[(EXP_OF[a as usize] as usize + EXP_OF[b as usize] as usize) % 255]
}

/// `a · α^e`.
#[inline]
pub fn mul_alpha(a: u8, e: usize) -> u8 {
    if a == 0 {
        return 0;
    }
    ALPHA_TO[(EXP_OF[a as usize] as usize + e) % 255]
}

/// Field division. `b` must be nonzero.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    debug_assert!(b != 0, "division by zero in GF(256)");
    if a == 0 {
        return 0;
    }
    let diff = 255 + EXP_OF[a as usize] as usize - EXP_OF[b as usize] as usize;
    ALPHA_TO[diff % 255]
}

/// `a / α^e`.
#[inline]
pub fn div_alpha(a: u8, e: usize) -> u8 {
    if a == 0 {
        return 0;
    }
    let diff = 255 + EXP_OF[a as usize] as usize - (e % 255);
    ALPHA_TO[diff % 255]
}

/// `α^e`.
#[inline]
pub fn alpha_pow(e: usize) -> u8 {
    ALPHA_TO[e % 255]
}

/// Solve `A·x = rhs` in GF(2⁸) by Gauss–Jordan elimination with partial
/// pivoting. `a` is row-major `size × size` and is destroyed; the solution
/// lands in `rhs`. Returns `false` if the system is singular.
pub(crate) fn solve(a: &mut [u8], rhs: &mut [u8], size: usize) -> bool {
    debug_assert_eq!(a.len(), size * size);
    debug_assert_eq!(rhs.len(), size);

    for col in 0..size {
        // Pivot: first row at or below the diagonal with a nonzero entry.
        let pivot = match (col..size).find(|&r| a[r * size + col] != 0) {
            Some(r) => r,
            None => return false,
        };
        if pivot != col {
            for k in 0..size {
                a.swap(pivot * size + k, col * size + k);
            }
            rhs.swap(pivot, col);
        }

        let diagonal = a[col * size + col];
        for k in 0..size {
            a[col * size + k] = div(a[col * size + k], diagonal);
        }
        rhs[col] = div(rhs[col], diagonal);

        for row in 0..size {
            if row == col {
                continue;
            }
            let factor = a[row * size + col];
            if factor == 0 {
                continue;
            }
            for k in 0..size {
                a[row * size + k] = add(a[row * size + k], mul(factor, a[col * size + k]));
            }
            rhs[row] = add(rhs[row], mul(factor, rhs[col]));
        }
    }
    true
}

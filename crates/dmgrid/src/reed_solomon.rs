//! Reed–Solomon error correction for ECC200 codeword streams.
//!
//! Works over the GF(2⁸) tables in [`crate::gf256`]. A block with `e`
//! check words corrects up to `⌊e/2⌋` byte errors: syndromes are evaluated
//! at `α¹..α^2t`, the error locator polynomial is found by solving the
//! syndrome Hankel system (Peterson–Gorenstein–Zierler, shrinking the system
//! until it becomes non-singular), roots are located by Chien search, and
//! the corrected symbol values are solved from the syndrome equations with
//! the known-good contributions moved to the right-hand side.
//!
//! Symbols from 52×52 upward carry several interleaved blocks; block `b`
//! owns stream positions `b, b+B, b+2B, …` within the data region and the
//! check region separately.

use crate::gf256;
use crate::symbol::SymbolSpec;

/// Successful correction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Correction {
    /// All syndromes were zero; the stream was untouched.
    Clean,
    /// Errors were located and repaired in place.
    Repaired {
        /// Number of corrected byte errors, summed over blocks.
        errors: usize,
    },
}

/// The stream contains more errors than the check words can locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecoverable;

impl std::fmt::Display for Unrecoverable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("reed-solomon correction failed")
    }
}

impl std::error::Error for Unrecoverable {}

/// Correct a full codeword stream in place, de-interleaving blocks as the
/// symbol size requires.
pub fn correct(words: &mut [u8], spec: &SymbolSpec) -> Result<Correction, Unrecoverable> {
    debug_assert_eq!(words.len(), spec.total_words());

    if spec.rs_blocks == 1 {
        return correct_block(words, spec.error_words);
    }

    let blocks = spec.rs_blocks;
    let mut errors = 0usize;
    for b in 0..blocks {
        let data_idx: Vec<usize> = (b..spec.data_words).step_by(blocks).collect();
        let check_idx: Vec<usize> = (spec.data_words + b..words.len()).step_by(blocks).collect();
        debug_assert_eq!(check_idx.len(), spec.error_words);

        let mut block: Vec<u8> = data_idx
            .iter()
            .chain(check_idx.iter())
            .map(|&i| words[i])
            .collect();
        match correct_block(&mut block, spec.error_words)? {
            Correction::Clean => {}
            Correction::Repaired { errors: e } => {
                errors += e;
                for (&slot, &byte) in data_idx.iter().chain(check_idx.iter()).zip(block.iter()) {
                    words[slot] = byte;
                }
            }
        }
    }

    if errors == 0 {
        Ok(Correction::Clean)
    } else {
        Ok(Correction::Repaired { errors })
    }
}

/// Correct a single Reed–Solomon block in place.
pub fn correct_block(words: &mut [u8], check_words: usize) -> Result<Correction, Unrecoverable> {
    let n = words.len();
    let t = check_words / 2;

    // Syndromes S_i = c(α^i), i = 1..2t. The first stream byte is the
    // highest-degree coefficient.
    let mut syndromes = vec![0u8; 2 * t + 1];
    let mut all_zero = true;
    for i in 1..=2 * t {
        let mut s = 0u8;
        for j in 0..n {
            s = gf256::add(s, gf256::mul_alpha(words[n - 1 - j], j * i));
        }
        syndromes[i] = s;
        all_zero &= s == 0;
    }
    if all_zero {
        return Ok(Correction::Clean);
    }

    // Error locator σ: largest non-singular ν×ν syndrome system, ν ≤ t.
    let sigma = find_locator(&syndromes, t).ok_or(Unrecoverable)?;

    // Chien search over every stream position.
    let roots: Vec<usize> = (0..n)
        .filter(|&i| {
            let mut sum = 1u8;
            for (k, &coeff) in sigma.iter().enumerate() {
                sum = gf256::add(sum, gf256::div_alpha(coeff, i * k + i));
            }
            sum == 0
        })
        .collect();
    if roots.is_empty() || roots.len() > t {
        return Err(Unrecoverable);
    }

    // Corrected values at the error positions: solve
    // Σ_k Y_k · α^{(i+1)·X_k} = Σ_{j good} c_j · α^{(i+1)·j}.
    let e = roots.len();
    let mut a = vec![0u8; e * e];
    let mut rhs = vec![0u8; e];
    for i in 0..e {
        for (k, &x) in roots.iter().enumerate() {
            a[i * e + k] = gf256::alpha_pow((i + 1) * x);
        }
        let mut s = 0u8;
        for j in 0..n {
            if roots.binary_search(&j).is_err() {
                s = gf256::add(s, gf256::mul_alpha(words[n - 1 - j], (i + 1) * j));
            }
        }
        rhs[i] = s;
    }
    if !gf256::solve(&mut a, &mut rhs, e) {
        return Err(Unrecoverable);
    }
    for (&x, &value) in roots.iter().zip(rhs.iter()) {
        words[n - 1 - x] = value;
    }
    Ok(Correction::Repaired { errors: e })
}

/// Solve for the σ coefficients, shrinking the system until non-singular.
fn find_locator(syndromes: &[u8], t: usize) -> Option<Vec<u8>> {
    for nu in (1..=t).rev() {
        let mut a = vec![0u8; nu * nu];
        let mut rhs = vec![0u8; nu];
        for i in 0..nu {
            for k in 0..nu {
                a[i * nu + k] = syndromes[nu + i - k];
            }
            rhs[i] = syndromes[nu + i + 1];
        }
        if gf256::solve(&mut a, &mut rhs, nu) {
            return Some(rhs);
        }
    }
    None
}

/// ECC200 check words for a data sequence: the remainder of
/// `data(x)·x^nc mod g(x)` with `g(x) = Π_{i=1..nc} (x + α^i)`.
///
/// The decoder itself never encodes; this is the shared primitive for
/// self-tests and for synthesizing known-good streams.
pub fn check_words(data: &[u8], n_check: usize) -> Vec<u8> {
    // Generator coefficients, leading term first, gen[0] = 1.
    let mut gen = vec![0u8; n_check + 1];
    gen[0] = 1;
    let mut degree = 0usize;
    for i in 1..=n_check {
        degree += 1;
        for k in (1..=degree).rev() {
            gen[k] = gf256::add(gen[k], gf256::mul_alpha(gen[k - 1], i));
        }
        // gen[0] stays 1: the product of monic factors is monic.
    }

    // Synthetic division of data(x)·x^nc by g(x).
    let mut rem = vec![0u8; n_check];
    for &d in data {
        let factor = gf256::add(d, rem[0]);
        rem.rotate_left(1);
        rem[n_check - 1] = 0;
        for k in 0..n_check {
            rem[k] = gf256::add(rem[k], gf256::mul(factor, gen[k + 1]));
        }
    }
    rem
}

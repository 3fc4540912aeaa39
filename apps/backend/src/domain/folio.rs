//! Human-facing order codes.
//!
//! A folio is `RF-` followed by 8 characters of Crockford's Base32 alphabet.

use rand::Rng;

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U
const PREFIX: &str = "RF-";
const CODE_LEN: usize = 8;

/// Generate a folio from the thread-local, OS-seeded RNG.
pub fn generate_folio() -> String {
    generate_folio_with(&mut rand::rng())
}

/// Generate a folio from the given RNG.
pub fn generate_folio_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut s = String::with_capacity(PREFIX.len() + CODE_LEN);
    s.push_str(PREFIX);
    for _ in 0..CODE_LEN {
        s.push(CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char);
    }
    s
}

pub fn is_valid_folio(folio: &str) -> bool {
    folio
        .strip_prefix(PREFIX)
        .is_some_and(|code| code.len() == CODE_LEN && code.bytes().all(|b| CROCKFORD.contains(&b)))
}

//! Wire-schema identifier derivation.
//!
//! Every generated file starts with a random 64-bit root id. Enum and struct
//! ids are derived from that root and the type name with FNV-1a, so they stay
//! stable for as long as the root id is recovered from the previous output.
//! All ids carry the most-significant bit, as the wire format requires.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Bit forced on in every emitted id.
pub const MSB_FLAG: u64 = 1 << 63;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fresh root id from OS-seeded randomness, with the top bit set.
pub fn random_root_id() -> u64 {
    ChaCha20Rng::from_entropy().next_u64() | MSB_FLAG
}

/// Standard 64-bit FNV-1a.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Id of a named type under `root_id`: FNV-1a over the big-endian root bytes
/// followed by the UTF-8 name, top bit set.
pub fn derive_id(root_id: u64, name: &str) -> u64 {
    let mut seed = Vec::with_capacity(8 + name.len());
    seed.extend_from_slice(&root_id.to_be_bytes());
    seed.extend_from_slice(name.as_bytes());
    fnv1a64(&seed) | MSB_FLAG
}

/// `@0x` followed by exactly 16 lowercase hex digits.
pub fn format_hex(id: u64) -> String {
    format!("@0x{id:016x}")
}

/// Recover the root id from the first line of previously generated output.
///
/// Looks for `@0x<1-16 hex digits>` followed by optional whitespace and `;`
/// anywhere on the first line. A zero value is treated as absent.
pub fn extract_root_id(text: &str) -> Option<u64> {
    let first_line = text.lines().next()?;

    first_line.match_indices("@0x").find_map(|(index, marker)| {
        let rest = &first_line[index + marker.len()..];
        let digits = rest.bytes().take_while(u8::is_ascii_hexdigit).count();
        if digits == 0 || digits > 16 {
            return None;
        }
        if !rest[digits..].trim_start().starts_with(';') {
            return None;
        }
        u64::from_str_radix(&rest[..digits], 16)
            .ok()
            .filter(|&id| id != 0)
    })
}

/// Read only the first line of `path` and [`extract_root_id`] from it.
///
/// A missing or unreadable file is simply "no id".
pub fn read_root_id(path: &Path) -> Option<u64> {
    let file = File::open(path).ok()?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line).ok()?;
    extract_root_id(&first_line)
}

/// The root id chosen for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootId {
    pub value: u64,
    /// True when the id was recovered from an existing output file.
    pub reused: bool,
}

/// Reuse the root id of the file at `path` if it has one, else draw a new one.
pub fn resolve_root_id(path: &Path) -> RootId {
    match read_root_id(path) {
        Some(value) => RootId {
            value,
            reused: true,
        },
        None => RootId {
            value: random_root_id(),
            reused: false,
        },
    }
}

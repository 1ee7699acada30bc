//! Workspace password generation

use rand::rngs::OsRng;
use rand::Rng;

/// Password length used when the configuration does not set one
pub const DEFAULT_PASSWORD_LENGTH: usize = 10;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random password of lowercase letters and digits
///
/// Characters are drawn uniformly from the OS random source, since the
/// result is handed to the workspace as a live credential.
pub fn generate_password(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

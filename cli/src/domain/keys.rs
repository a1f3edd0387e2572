//! Gossip encryption key normalisation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::Sha1;

/// Length in bytes of a gossip encryption key.
pub const KEY_LENGTH: usize = 16;

const PBKDF2_ROUNDS: u32 = 20_000;

/// Turn an operator-supplied key into the base64 form the agent expects.
///
/// Keys that already decode to exactly [`KEY_LENGTH`] bytes are passed
/// through unchanged. Anything else is treated as a passphrase and stretched
/// with PBKDF2-HMAC-SHA1 (empty salt).
#[must_use]
pub fn encrypt_key(key: &str) -> String {
    if let Ok(decoded) = STANDARD.decode(key)
        && decoded.len() == KEY_LENGTH
    {
        return key.to_string();
    }

    let mut derived = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha1>(key.as_bytes(), b"", PBKDF2_ROUNDS, &mut derived);
    STANDARD.encode(derived)
}

/// Generates a password-reset token: 32 random bytes, hex-encoded (64 chars).
///
/// Reset tokens are opaque and unsigned; they are only ever compared against
/// the value stored on the user row.
pub fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Single-use credential embedded in a confirmation link. 256 bits from the
/// OS CSPRNG, encoded as URL-safe base64 so it can go straight into a query
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl AsRef<str> for ConfirmationToken {
    fn as_ref(&self) -> &str { &self.0 }
}

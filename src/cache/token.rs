/// Token as handed out by the issuer.
///
/// `scopes` empty means the grant is unrestricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_in_seconds: u64,
    pub scopes: Vec<String>,
}

impl Token {
    pub fn new(value: String, expires_in_seconds: u64, scopes: Vec<String>) -> Self {
        Self {
            value,
            expires_in_seconds,
            scopes,
        }
    }
}

use serde::Deserialize;

/// Account deletion asks for the password again before anything is removed.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub password: String,
}

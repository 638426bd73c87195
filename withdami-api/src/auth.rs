use uuid::Uuid;

use crate::{Error, STUB_UUID};

#[derive(Clone, Debug, bolero::generator::TypeGenerator, serde::Deserialize, serde::Serialize)]
pub struct NewSession {
    pub user: String,
    pub password: String,

    /// Free-form label for the device logging in, shown when listing sessions
    pub device: String,
}

impl NewSession {
    pub fn new(user: String, password: String, device: String) -> NewSession {
        NewSession {
            user,
            password,
            device,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.user)?;
        crate::validate_string(&self.password)?;
        crate::validate_string(&self.device)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }
}

use uuid::Uuid;

use crate::{Error, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct AdminId(pub Uuid);

impl AdminId {
    pub fn stub() -> AdminId {
        AdminId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Admin {
    pub id: AdminId,
    pub name: String,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewAdmin {
    pub id: AdminId,
    pub name: String,
    pub initial_password: String,
}

impl NewAdmin {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidName(self.name.clone()));
        }
        crate::validate_string(&self.initial_password)?;
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile record persisted into the users collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub last_name: String,
    pub name: String,
    #[serde(rename = "cpf")]
    pub national_id: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "adress")]
    pub address: String,
    /// Uid of the authentication identity this profile belongs to.
    pub user_auth_id: String,
}

/// Registration payload for a new authentication identity. Never persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuth {
    pub email: String,
    pub password: String,
    pub last_name: String,
    pub name: String,
    #[serde(rename = "cpf")]
    pub national_id: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "adress")]
    pub address: String,
}

impl UserAuth {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }

    /// Profile counterpart of this registration, linked to `user_auth_id`.
    pub fn to_user(&self, user_auth_id: impl Into<String>) -> User {
        User {
            email: self.email.clone(),
            last_name: self.last_name.clone(),
            name: self.name.clone(),
            national_id: self.national_id.clone(),
            postal_code: self.postal_code.clone(),
            address: self.address.clone(),
            user_auth_id: user_auth_id.into(),
        }
    }
}

impl fmt::Debug for UserAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAuth")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("last_name", &self.last_name)
            .field("name", &self.name)
            .field("national_id", &self.national_id)
            .field("postal_code", &self.postal_code)
            .field("address", &self.address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_auth() -> UserAuth {
        UserAuth {
            email: "generic@generic.com.br".to_string(),
            password: "123456789".to_string(),
            last_name: "generic".to_string(),
            name: "Generic".to_string(),
            national_id: "88888888888".to_string(),
            postal_code: "47800000".to_string(),
            address: "generic address".to_string(),
        }
    }

    #[test]
    fn user_serializes_with_stored_profile_keys() {
        let user = user_auth().to_user("123-456-78945-68");
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["userAuthId"], "123-456-78945-68");
        assert_eq!(value["lastName"], "generic");
        assert_eq!(value["cpf"], "88888888888");
        assert_eq!(value["cep"], "47800000");
        assert_eq!(value["adress"], "generic address");
        assert!(value.get("nationalId").is_none());
        assert!(value.get("address").is_none());
        assert_eq!(value.as_object().unwrap().len(), 7);
    }

    #[test]
    fn user_auth_reads_stored_profile_keys() {
        let value = serde_json::json!({
            "email": "generic@generic.com.br",
            "password": "123456789",
            "lastName": "generic",
            "name": "Generic",
            "cpf": "88888888888",
            "cep": "47800000",
            "adress": "generic address",
        });

        let parsed: UserAuth = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, user_auth());
    }

    #[test]
    fn user_auth_debug_hides_password() {
        let rendered = format!("{:?}", user_auth());
        assert!(!rendered.contains("123456789"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn display_name_joins_first_and_last_name() {
        assert_eq!(user_auth().display_name(), "Generic generic");
    }
}

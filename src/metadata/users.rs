use serde_json::json;

use super::{MetadataStore, user_filter, user_not_found};
use crate::auth::SecuredPassword;
use crate::error::{Error, Result};
use crate::store::{Collection, Document, from_document, to_document};
use crate::types::{NewUser, User, UserUpdate};

impl MetadataStore {
    /// Registers a user. Only the salt and derived key of the password are stored.
    pub fn create_user(&self, new_user: &NewUser) -> Result<String> {
        if self.store.count(Collection::User, &user_filter(&new_user.user_name))? > 0 {
            return Err(Error::AlreadyExists(format!(
                "There is already a user associated with user name: {}",
                new_user.user_name
            )));
        }

        let secured = self.hasher.secure(&new_user.password);
        let user = User {
            id: String::new(),
            user_name: new_user.user_name.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            email: new_user.email.clone(),
            dev_access: new_user.dev_access.clone(),
            salt: secured.salt_hex(),
            secured_password: secured.key_hex(),
        };

        let id = self.store.insert_one(Collection::User, to_document(&user)?)?;
        tracing::info!("Created user {} ({})", new_user.user_name, id);
        Ok(id)
    }

    /// Checks a password against the stored salt and derived key.
    pub fn verify_user_login(&self, password: &str, user_name: &str) -> Result<bool> {
        let user = self.get_user(user_name)?;
        let stored = SecuredPassword::from_hex(&user.salt, &user.secured_password)?;
        let verified = self.hasher.verify(password, &stored);
        if !verified {
            tracing::debug!("Password mismatch for user {}", user_name);
        }
        Ok(verified)
    }

    pub fn get_user(&self, user_name: &str) -> Result<User> {
        let doc = self
            .store
            .find_one(Collection::User, &user_filter(user_name))?
            .ok_or_else(|| user_not_found(user_name))?;
        from_document(doc)
    }

    /// Deletes a user together with any session cookies it still holds.
    pub fn delete_user(&self, user_name: &str) -> Result<()> {
        let query = user_filter(user_name);
        if self.store.find_one(Collection::User, &query)?.is_none() {
            return Err(user_not_found(user_name));
        }

        if self.store.delete_one(Collection::User, &query)? == 0 {
            return Err(Error::Inconsistency(format!("user {user_name} could not be deleted")));
        }
        let cookies = self.store.delete_many(Collection::Cookie, &query)?;

        tracing::info!("Deleted user {} and {} cookies", user_name, cookies);
        Ok(())
    }

    /// Merges the given fields into the user. A new password gets a new salt.
    pub fn update_user(&self, user_name: &str, update: &UserUpdate) -> Result<()> {
        let query = user_filter(user_name);
        if self.store.find_one(Collection::User, &query)?.is_none() {
            return Err(user_not_found(user_name));
        }
        if update.is_empty() {
            return Ok(());
        }

        let mut set = Document::new();
        if let Some(first_name) = &update.first_name {
            set.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = &update.last_name {
            set.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(email) = &update.email {
            set.insert("email".to_string(), json!(email));
        }
        if let Some(dev_access) = &update.dev_access {
            set.insert("dev_access".to_string(), json!(dev_access));
        }
        if let Some(password) = &update.password {
            let secured = self.hasher.secure(password);
            set.insert("salt".to_string(), json!(secured.salt_hex()));
            set.insert("secured_password".to_string(), json!(secured.key_hex()));
        }

        if self.store.update_many(Collection::User, &query, &set)? == 0 {
            return Err(Error::Inconsistency(format!("user {user_name} vanished during update")));
        }

        tracing::info!("Updated user {}", user_name);
        Ok(())
    }
}

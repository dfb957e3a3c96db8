use chrono::Utc;

use super::{MetadataStore, id_filter, user_filter, user_not_found};
use crate::error::{Error, Result};
use crate::store::{Collection, document_id, from_document, to_document};
use crate::types::Cookie;

impl MetadataStore {
    /// Stores the session cookie of a user, replacing any previous one so a
    /// user holds at most one cookie.
    pub fn write_cookie(&self, user_name: &str, cookie: &str) -> Result<String> {
        if self.store.count(Collection::User, &user_filter(user_name))? == 0 {
            return Err(user_not_found(user_name));
        }

        let replaced = self
            .store
            .delete_many(Collection::Cookie, &user_filter(user_name))?;
        if replaced > 0 {
            tracing::debug!("Replacing {} cookies of user {}", replaced, user_name);
        }

        let doc = Cookie {
            id: String::new(),
            user_name: user_name.to_string(),
            cookie: cookie.to_string(),
            created_at: Utc::now(),
        };
        let id = self.store.insert_one(Collection::Cookie, to_document(&doc)?)?;
        tracing::info!("Created cookie for user {}", user_name);
        Ok(id)
    }

    pub fn get_cookie(&self, user_name: &str) -> Result<Cookie> {
        let doc = self
            .store
            .find_one(Collection::Cookie, &user_filter(user_name))?
            .ok_or_else(|| cookie_not_found(user_name))?;
        from_document(doc)
    }

    pub fn delete_cookie(&self, user_name: &str) -> Result<()> {
        let doc = self
            .store
            .find_one(Collection::Cookie, &user_filter(user_name))?
            .ok_or_else(|| cookie_not_found(user_name))?;
        let id = document_id(&doc)?;

        if self.store.delete_one(Collection::Cookie, &id_filter(&id))? == 0 {
            tracing::warn!("Cookie of user {} disappeared during delete", user_name);
            return Err(Error::Inconsistency(format!(
                "cookie for user {user_name} could not be deleted"
            )));
        }

        tracing::info!("Deleted cookie for user {}", user_name);
        Ok(())
    }
}

fn cookie_not_found(user_name: &str) -> Error {
    Error::NotFound(format!("There is no cookie associated with user name: {user_name}"))
}

use serde::Serialize;

use crate::auth::generate_session_cookie;
use crate::metadata::MetadataStore;
use crate::types::{NewUser, Status, User};

use super::{UserCommands, emit, emit_status, print_json};

/// A user as shown on the command line; credentials never leave the store.
#[derive(Serialize)]
struct UserOutput {
    id: String,
    user_name: String,
    first_name: String,
    last_name: String,
    email: String,
    dev_access: Vec<String>,
}

impl From<User> for UserOutput {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            dev_access: user.dev_access,
        }
    }
}

#[derive(Serialize)]
struct Session {
    user_name: String,
    cookie: String,
}

pub fn run_user(meta: &MetadataStore, command: UserCommands) -> anyhow::Result<bool> {
    match command {
        UserCommands::Add {
            user_name,
            first_name,
            last_name,
            email,
            password,
            dev_access,
        } => {
            let new_user = NewUser {
                first_name,
                last_name,
                user_name,
                password,
                email,
                dev_access,
            };
            let result = meta.create_user(&new_user);
            let reason = match &result {
                Ok(id) => format!("user with id: {id} has been created"),
                Err(_) => String::new(),
            };
            emit_status(result, reason)
        }
        UserCommands::Show { user_name } => emit(meta.get_user(&user_name).map(UserOutput::from)),
        UserCommands::Remove { user_name } => emit_status(
            meta.delete_user(&user_name),
            format!("User {user_name} has been deleted"),
        ),
        UserCommands::Login {
            user_name,
            password,
        } => match meta.verify_user_login(&password, &user_name) {
            Ok(true) => {
                let cookie = generate_session_cookie();
                emit(meta.write_cookie(&user_name, &cookie).map(|_| Session {
                    user_name,
                    cookie,
                }))
            }
            Ok(false) => {
                print_json(&Status::failed(format!("invalid password for user {user_name}")))?;
                Ok(false)
            }
            Err(e) => {
                print_json(&Status::failed(e.to_string()))?;
                Ok(false)
            }
        },
        UserCommands::Logout { user_name } => emit_status(
            meta.delete_cookie(&user_name),
            format!("Cookie has been deleted for user {user_name}"),
        ),
    }
}

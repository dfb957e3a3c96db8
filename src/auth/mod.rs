mod password;
mod session;

pub use password::{PasswordHasher, SecuredPassword, constant_time_eq};
pub use session::generate_session_cookie;

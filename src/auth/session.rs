use rand::Rng;

const COOKIE_PREFIX: &str = "repometa";
const COOKIE_BYTES: usize = 32;

/// Generates an opaque session cookie: `repometa_<hex>`.
#[must_use]
pub fn generate_session_cookie() -> String {
    let mut bytes = [0u8; COOKIE_BYTES];
    rand::thread_rng().fill(&mut bytes);
    format!("{COOKIE_PREFIX}_{}", hex::encode(bytes))
}

use std::env;

use actix_web::{dev::ServiceRequest, web, Error};
use actix_web_httpauth::extractors::{
    basic::{BasicAuth, Config},
    AuthenticationError,
};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::state::{AdminCredentials, AppState};

const AUTH_REALM: &str = "Roomly Admin";

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Reads the admin account from ADMIN_USER / ADMIN_PASSWORD. Only the
/// hash of the password is retained.
pub fn load_admin_credentials() -> Result<AdminCredentials, password_hash::Error> {
    let username = env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    if password == "admin" {
        log::warn!(
            "ADMIN_PASSWORD not set. Using default password 'admin'. \
             Set ADMIN_PASSWORD in production."
        );
    }

    Ok(AdminCredentials {
        username,
        password_hash: hash_password(&password)?,
    })
}

/// Extractor config so 401s issued before the validator runs (e.g. a
/// request with no Authorization header) carry the same realm.
pub fn basic_auth_config() -> Config {
    Config::default().realm(AUTH_REALM)
}

fn challenge() -> Error {
    AuthenticationError::from(basic_auth_config()).into()
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return Err((challenge(), req));
    };

    let admin = &state.admin;
    let password = credentials.password().unwrap_or_default();
    if credentials.user_id() == admin.username && verify_password(password, &admin.password_hash) {
        Ok(req)
    } else {
        Err((challenge(), req))
    }
}

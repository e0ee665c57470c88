use std::path::PathBuf;

use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub admin: AdminCredentials,
    pub media_root: PathBuf,
}

/// Admin account for the `/hotel-admins` surface, loaded from the
/// environment at startup. Only the argon2 hash is kept in memory.
#[derive(Clone, Debug)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: String,
}

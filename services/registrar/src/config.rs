use std::path::PathBuf;

/// Registrar service configuration loaded from environment variables.
#[derive(Debug)]
pub struct RegistrarConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3000). Env var: `REGISTRAR_PORT`.
    pub port: u16,
    /// Directory uploads are written to and served from (default `public/uploads`).
    /// Env var: `UPLOAD_DIR`.
    pub upload_dir: PathBuf,
    /// bcrypt work factor (default 10). Env var: `BCRYPT_COST`.
    pub bcrypt_cost: u32,
    /// Password for the bootstrap `admin` account. Seeding is skipped when unset.
    /// Env var: `SEED_ADMIN_PASSWORD`.
    pub seed_admin_password: Option<String>,
}

impl RegistrarConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            port: std::env::var("REGISTRAR_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/uploads")),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            seed_admin_password: std::env::var("SEED_ADMIN_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

use std::fmt;

use crate::error::ConfigError;

const MIN_SECRET_LENGTH: usize = 32;
/// Ten years; keeps every expiry computation inside chrono's range
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub password: PasswordSettings,
    /// When absent the service runs on the in-memory credential store
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// JWT authentication settings
///
/// Loaded once at startup and handed to the token issuer and refresh token
/// manager at construction. The secret is never printed.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        check_lifetime("jwt.access_token_expiry", self.access_token_expiry)?;
        check_lifetime("jwt.refresh_token_expiry", self.refresh_token_expiry)?;
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        Ok(())
    }
}

fn check_lifetime(name: &str, seconds: i64) -> Result<(), ConfigError> {
    if seconds <= 0 || seconds > MAX_TOKEN_LIFETIME_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {} seconds",
            name, MAX_TOKEN_LIFETIME_SECONDS
        )));
    }
    Ok(())
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Password hashing settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    pub bcrypt_cost: u32,
}

impl PasswordSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        Ok(())
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Read `configuration.yaml` (optional) and `APP__*` environment overrides,
/// e.g. `APP__JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.jwt.validate()?;
    settings.password.validate()?;
    Ok(settings)
}

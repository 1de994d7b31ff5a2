use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;
use voca_api::validation::{DEFAULT_EMAIL_DOMAINS, EmailDomains};
use voca_tokens::{SigningKeys, TokenError, chain::DEFAULT_LOGIN_TOKEN_TTL_SECS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("signing keys rejected: {0}")]
    Keys(#[from] TokenError),

    #[error("VOCA_ALLOWED_EMAIL_DOMAINS lists no domains")]
    NoEmailDomains,
}

/// Everything the server needs, read once before the first request.
#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub keys: SigningKeys,
    pub login_token_ttl_secs: i64,
    pub email_domains: EmailDomains,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("VOCA_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("VOCA_PORT").unwrap_or_else(|| "3000".into());
        let addr_text = format!("{}:{}", host, port);
        let addr = addr_text.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
            name: "VOCA_HOST/VOCA_PORT",
            value: addr_text.clone(),
        })?;

        let db_path = var("VOCA_DB_PATH").unwrap_or_else(|| "voca.db".into()).into();

        let keys = match (
            var("VOCA_LOGIN_SECRET"),
            var("VOCA_USER_SECRET"),
            var("VOCA_GROUP_SECRET"),
        ) {
            (Some(login), Some(user), Some(group)) => SigningKeys::new(login, user, group)?,
            (None, None, None) => {
                warn!("No signing secrets configured; generated random ones. Tokens will not survive a restart.");
                SigningKeys::generate()
            }
            _ => {
                return Err(ConfigError::Invalid {
                    name: "VOCA_LOGIN_SECRET/VOCA_USER_SECRET/VOCA_GROUP_SECRET",
                    value: "set all three or none".into(),
                });
            }
        };

        let login_token_ttl_secs = match var("VOCA_LOGIN_TOKEN_TTL_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .ok_or(ConfigError::Invalid {
                    name: "VOCA_LOGIN_TOKEN_TTL_SECS",
                    value: raw,
                })?,
            None => DEFAULT_LOGIN_TOKEN_TTL_SECS,
        };

        let email_domains = match var("VOCA_ALLOWED_EMAIL_DOMAINS") {
            Some(raw) => EmailDomains::new(raw.split(',')),
            None => EmailDomains::new(DEFAULT_EMAIL_DOMAINS),
        };
        if email_domains.is_empty() {
            return Err(ConfigError::NoEmailDomains);
        }

        Ok(Self {
            addr,
            db_path,
            keys,
            login_token_ttl_secs,
            email_domains,
            cors_origin: var("VOCA_CORS_ORIGIN"),
        })
    }
}

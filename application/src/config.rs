//! [`Config`]-related definitions.

use std::time;

use common::pagination::DecodePolicy;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use http::header::{HeaderValue, InvalidHeaderValue};
use serde::Deserialize;
use smart_default::SmartDefault;
use tower_http::cors::AllowOrigin;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Upstream [randomuser.me] configuration.
    ///
    /// [randomuser.me]: https://randomuser.me
    pub random_user: RandomUser,

    /// Users listing configuration.
    pub list: List,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,

    /// Timeout after which a request is aborted.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub request_timeout: time::Duration,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    ///
    /// `*` allows any origin.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

impl Cors {
    /// Returns [`AllowedOrigins`] of this [`Cors`] configuration.
    ///
    /// # Errors
    ///
    /// If any of the [`Cors::origins`] is not a valid header value.
    pub fn allowed_origins(&self) -> Result<AllowedOrigins, InvalidOrigin> {
        if self.origins.iter().any(|o| o == "*") {
            return Ok(AllowedOrigins::Any);
        }
        self.origins
            .iter()
            .map(|origin| {
                origin.parse().map_err(|source| InvalidOrigin {
                    origin: origin.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()
            .map(AllowedOrigins::List)
    }
}

/// Origins allowed by a [`Cors`] policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AllowedOrigins {
    /// Any origin is allowed.
    Any,

    /// Only the listed origins are allowed.
    List(Vec<HeaderValue>),
}

impl From<AllowedOrigins> for AllowOrigin {
    fn from(origins: AllowedOrigins) -> Self {
        match origins {
            AllowedOrigins::Any => Self::any(),
            AllowedOrigins::List(list) => Self::list(list),
        }
    }
}

/// Error of parsing a [`Cors::origins`] entry.
#[derive(Debug, Display, Error)]
#[display("`{origin}` is not a valid CORS origin: {source}")]
pub struct InvalidOrigin {
    /// Origin failed to parse.
    pub origin: String,

    /// Parsing error.
    pub source: InvalidHeaderValue,
}

/// Upstream [randomuser.me] configuration.
///
/// [randomuser.me]: https://randomuser.me
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct RandomUser {
    /// URL of the API endpoint.
    #[default("https://randomuser.me/api/".to_owned())]
    pub url: String,

    /// Number of users requested per population.
    #[default(5000)]
    pub results: usize,

    /// Timeout of a single request.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl From<&RandomUser> for service::Config {
    fn from(value: &RandomUser) -> Self {
        Self {
            populate_users: service::command::populate_users::Config {
                batch_size: value.results,
            },
        }
    }
}

impl From<RandomUser> for service::infra::source::random_user::Config {
    fn from(value: RandomUser) -> Self {
        let RandomUser {
            url,
            results: _,
            timeout,
        } = value;
        Self { url, timeout }
    }
}

/// Users listing configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct List {
    /// Policy of treating rows failed to decode.
    pub decode_policy: DecodePolicy,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::pagination::DecodePolicy;

    use http::header::HeaderValue;

    use super::{AllowedOrigins, Config, Cors};

    #[test]
    fn defaults_without_sources() {
        let conf = Config::new("surely/absent/config").unwrap();

        assert_eq!(conf.server.port, 8080);
        assert_eq!(conf.server.request_timeout, Duration::from_secs(30));
        assert_eq!(conf.random_user.results, 5000);
        assert_eq!(conf.random_user.url, "https://randomuser.me/api/");
        assert_eq!(conf.random_user.timeout, Duration::from_secs(10));
        assert_eq!(conf.list.decode_policy, DecodePolicy::Lossy);
        assert_eq!(conf.postgres.dbname, "postgres");
    }

    #[test]
    fn wildcard_allows_any_origin() {
        let cors = Cors {
            origins: vec!["https://a.example".into(), "*".into()],
        };

        assert_eq!(cors.allowed_origins().unwrap(), AllowedOrigins::Any);
        assert_eq!(
            Cors::default().allowed_origins().unwrap(),
            AllowedOrigins::Any,
        );
    }

    #[test]
    fn keeps_every_listed_origin() {
        let cors = Cors {
            origins: vec![
                "https://a.example".into(),
                "https://b.example".into(),
            ],
        };

        assert_eq!(
            cors.allowed_origins().unwrap(),
            AllowedOrigins::List(vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ]),
        );
    }

    #[test]
    fn rejects_invalid_origin() {
        let cors = Cors {
            origins: vec!["https://a.example".into(), "bad\norigin".into()],
        };

        let err = cors.allowed_origins().unwrap_err();
        assert_eq!(err.origin, "bad\norigin");
    }

    #[test]
    fn maps_into_service_config() {
        let conf = Config::default();

        let svc = service::Config::from(&conf.random_user);
        assert_eq!(svc.populate_users.batch_size, 5000);

        let source =
            service::infra::source::random_user::Config::from(conf.random_user);
        assert_eq!(source.timeout, Duration::from_secs(10));
    }
}

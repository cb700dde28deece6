//! [randomuser.me] [`Source`] implementation.
//!
//! [randomuser.me]: https://randomuser.me

use std::time::Duration;

use common::operations::{By, Fetch};
use reqwest::Client;
use serde::Deserialize;
use smart_default::SmartDefault;
use tracerr::Traced;

use crate::{
    domain::user::{self, Draft},
    infra::source::{self, Source},
};

/// [`RandomUser`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// URL of the API endpoint.
    #[default("https://randomuser.me/api/")]
    pub url: String,

    /// Timeout of a single request, including reading its body.
    #[default(Duration::from_secs(10))]
    pub timeout: Duration,
}

/// [randomuser.me] API client.
///
/// [randomuser.me]: https://randomuser.me
#[derive(Clone, Debug)]
pub struct RandomUser {
    /// HTTP client performing requests.
    client: Client,

    /// URL of the API endpoint.
    url: String,
}

impl RandomUser {
    /// Creates a new [`RandomUser`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the underlying HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Traced<source::Error>> {
        let Config { url, timeout } = config;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> source::Error))?;
        Ok(Self { client, url })
    }
}

impl Source<Fetch<By<Vec<Draft>, usize>>> for RandomUser {
    type Ok = Vec<Draft>;
    type Err = Traced<source::Error>;

    #[tracing::instrument(skip_all, fields(results = *by.inner()))]
    async fn execute(
        &self,
        Fetch(by): Fetch<By<Vec<Draft>, usize>>,
    ) -> Result<Self::Ok, Self::Err> {
        let results = by.into_inner();

        let response = self
            .client
            .get(self.url.as_str())
            .query(&[("results", results)])
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> source::Error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(tracerr::new!(source::Error::Status(status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(tracerr::from_and_wrap!(=> source::Error))?;
        let drafts = decode(&body)
            .map_err(tracerr::from_and_wrap!(=> source::Error))?;

        tracing::debug!("fetched {} `User`s", drafts.len());
        Ok(drafts)
    }
}

/// Decodes the provided [randomuser.me] response `body` into [`Draft`]s.
///
/// [randomuser.me]: https://randomuser.me
fn decode(body: &[u8]) -> Result<Vec<Draft>, serde_json::Error> {
    serde_json::from_slice::<dto::Response>(body)
        .map(|r| r.results.into_iter().map(Into::into).collect())
}

mod dto {
    //! [randomuser.me] response shapes.
    //!
    //! [randomuser.me]: https://randomuser.me

    use super::{user, Deserialize, Draft};

    #[derive(Debug, Deserialize)]
    pub(super) struct Response {
        pub(super) results: Vec<Person>,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct Person {
        name: Name,
        email: String,
        phone: String,
        #[serde(default)]
        cell: Option<String>,
        #[serde(default)]
        picture: user::Picture,
        registered: Registered,
    }

    #[derive(Debug, Deserialize)]
    struct Name {
        title: String,
        first: String,
        last: String,
    }

    #[derive(Debug, Deserialize)]
    struct Registered {
        date: user::RegistrationDateTime,
    }

    impl From<Person> for Draft {
        fn from(person: Person) -> Self {
            let Person {
                name: Name { title, first, last },
                email,
                phone,
                cell,
                picture,
                registered,
            } = person;

            Self {
                name: format!("{title} {first} {last}").into(),
                email: email.into(),
                phone: phone.into(),
                cell: cell.unwrap_or_default().into(),
                picture,
                registration: registered.date,
            }
        }
    }
}

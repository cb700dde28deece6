//! [`User`]-related REST API definitions.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use common::{pagination::IncompletePage, DateTime};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, user},
    query::{self, Query as _},
    read::user::list,
};

use crate::{api, define_error, AsError, Error};

/// Registered user.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// Unique, lexically sortable ID of this [`User`].
    pub id: String,

    /// Full name of this [`User`].
    pub name: String,

    /// Email address of this [`User`].
    pub email: String,

    /// [`Phone`] numbers of this [`User`].
    pub phone: Phone,

    /// Picture URLs of this [`User`].
    pub picture: user::Picture,

    /// [RFC 3339] date and time when this [`User`] was registered.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub registration_date: DateTime,
}

/// Phone numbers of a [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct Phone {
    /// Main phone number.
    pub main: String,

    /// Cell phone number, empty if none.
    pub cell: String,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        let domain::User {
            id,
            name,
            email,
            phone,
            cell,
            picture,
            registration,
        } = user;

        Self {
            id: id.to_string(),
            name: name.into(),
            email: email.into(),
            phone: Phone {
                main: phone.into(),
                cell: cell.into(),
            },
            picture,
            registration_date: registration.coerce(),
        }
    }
}

/// Query parameters of the [`list()`] handler.
///
/// Empty values are treated as absent.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Maximum number of [`User`]s to return.
    pub limit: Option<i64>,

    /// ID of the [`User`] to list strictly after.
    pub starting_after: Option<String>,

    /// ID of the [`User`] to list strictly before.
    pub ending_before: Option<String>,

    /// Substring of the [`User`] email to filter by.
    pub email: Option<String>,
}

impl TryFrom<ListParams> for query::ListUsers {
    type Error = user::MalformedId;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let ListParams {
            limit,
            starting_after,
            ending_before,
            email,
        } = params;

        let cursor = |raw: Option<String>| {
            raw.filter(|s| !s.is_empty())
                .map(|s| user::Id::parse(&s))
                .transpose()
        };

        Ok(Self {
            limit,
            starting_after: cursor(starting_after)?,
            ending_before: cursor(ending_before)?,
            email: email.filter(|e| !e.is_empty()).map(Into::into),
        })
    }
}

/// Lists a page of [`User`]s in the descending registration order.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - the query string cannot be parsed;
/// - `MALFORMED_CURSOR` - a cursor is not a valid `User` ID;
/// - `INVALID_LIMIT` - the limit is out of range;
/// - `AMBIGUOUS_CURSORS` - both cursors are provided;
/// - `INCOMPLETE_PAGE` - some rows failed to decode under the strict policy.
#[tracing::instrument(skip_all)]
pub async fn list(
    State(api::State { service, policy }): State<api::State>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<User>>, Error> {
    let Query(params) = params.map_err(AsError::into_error)?;
    let query = query::ListUsers::try_from(params)
        .map_err(AsError::into_error)?;

    let users = service
        .execute(query)
        .await
        .map_err(AsError::into_error)?
        .resolve(policy)
        .map_err(AsError::into_error)?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Result of the [`populate()`] handler.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Populated {
    /// Number of created [`User`]s.
    pub created: usize,
}

/// Populates [`User`]s from the upstream source.
///
/// # Errors
///
/// Possible error codes:
/// - `UPSTREAM_FETCH_FAILED` - the upstream source failed.
#[tracing::instrument(skip_all)]
pub async fn populate(
    State(api::State { service, .. }): State<api::State>,
) -> Result<(http::StatusCode, Json<Populated>), Error> {
    let created = service
        .execute(command::PopulateUsers)
        .await
        .map_err(AsError::into_error)?
        .len();

    tracing::info!("populated {created} `User`s");
    Ok((http::StatusCode::CREATED, Json(Populated { created })))
}

impl AsError for user::MalformedId {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "MALFORMED_CURSOR"]
                #[status = BAD_REQUEST]
                #[message = "Cursor is not a valid `User` ID"]
                MalformedCursor,
            }
        }

        Some(Error::MalformedCursor.into())
    }
}

impl AsError for query::users::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use common::pagination::ArgumentsError as A;

        define_error! {
            enum Error {
                #[code = "INVALID_LIMIT"]
                #[status = BAD_REQUEST]
                #[message = "`limit` must be between 1 and 100"]
                InvalidLimit,

                #[code = "AMBIGUOUS_CURSORS"]
                #[status = BAD_REQUEST]
                #[message = "Only one of `starting_after` and \
                             `ending_before` can be used"]
                AmbiguousCursors,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidArguments(A::LimitOutOfRange(_)) => {
                Some(Error::InvalidLimit.into())
            }
            Self::InvalidArguments(A::AmbiguousCursors) => {
                Some(Error::AmbiguousCursors.into())
            }
        }
    }
}

impl AsError for IncompletePage<list::RowError> {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INCOMPLETE_PAGE"]
                #[status = INTERNAL_SERVER_ERROR]
                #[message = "Some `User`s of the page cannot be read"]
                IncompletePage,
            }
        }

        Some(Error::IncompletePage.into())
    }
}

impl AsError for command::populate_users::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "UPSTREAM_FETCH_FAILED"]
                #[status = BAD_GATEWAY]
                #[message = "Failed to fetch `User`s from the upstream"]
                UpstreamFetchFailed,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Upstream(_) => Some(Error::UpstreamFetchFailed.into()),
        }
    }
}

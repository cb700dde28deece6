//! [`Query`] for listing [`User`]s.
//!
//! [`User`]: crate::domain::User

use common::{
    operations::{By, Select},
    pagination::ArgumentsError,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::user,
    infra::{database, Database},
    read::user::list,
    Service,
};

use super::Query;

/// [`Query`] for listing a page of [`User`]s in the descending
/// `(registration, id)` order.
///
/// [`User`]: crate::domain::User
#[derive(Clone, Debug, Default)]
pub struct ListUsers {
    /// Maximum number of [`User`]s to return.
    ///
    /// [`User`]: crate::domain::User
    pub limit: Option<i64>,

    /// Return only [`User`]s strictly after this one.
    ///
    /// [`User`]: crate::domain::User
    pub starting_after: Option<user::Id>,

    /// Return only [`User`]s strictly before this one.
    ///
    /// [`User`]: crate::domain::User
    pub ending_before: Option<user::Id>,

    /// Return only [`User`]s whose [`user::Email`] contains this fragment.
    ///
    /// [`User`]: crate::domain::User
    pub email: Option<list::EmailFragment>,
}

impl<Db, Src> Query<ListUsers> for Service<Db, Src>
where
    Db: Database<
        Select<By<list::Page, list::Selector>>,
        Ok = list::Page,
        Err = Traced<database::Error>,
    >,
{
    type Ok = list::Page;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(
            limit = ?query.limit,
            starting_after = ?query.starting_after.map(|id| id.to_string()),
            ending_before = ?query.ending_before.map(|id| id.to_string()),
            email = ?query.email.as_ref().map(ToString::to_string),
        ),
    )]
    async fn execute(&self, query: ListUsers) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ListUsers {
            limit,
            starting_after,
            ending_before,
            email,
        } = query;

        let arguments = list::Arguments::new(
            limit,
            starting_after,
            ending_before,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let page = self
            .database()
            .execute(Select(By::new(list::Selector {
                arguments,
                filter: list::Filter { email },
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if !page.is_complete() {
            tracing::warn!(
                "{} of {} rows failed to decode",
                page.failures.len(),
                page.failures.len() + page.nodes.len(),
            );
        }
        Ok(page)
    }
}

/// Error of [`ListUsers`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Invalid pagination arguments.
    #[display("Invalid arguments: {_0}")]
    InvalidArguments(ArgumentsError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

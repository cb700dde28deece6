//! [`Command`] for populating [`User`]s from the upstream [`Source`].

use common::operations::{By, Fetch};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, source, Source},
    Service,
};

use super::{create_users, Command, CreateUsers};

/// [`Command`] for populating [`User`]s from the upstream [`Source`].
///
/// Fetches [`Config::batch_size`] [`user::Draft`]s and creates them as
/// [`CreateUsers`] does.
#[derive(Clone, Copy, Debug, Default)]
pub struct PopulateUsers;

/// [`PopulateUsers`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Number of [`User`]s requested from the upstream [`Source`] at once.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { batch_size: 5000 }
    }
}

impl<Db, Src> Command<PopulateUsers> for Service<Db, Src>
where
    Src: Source<
        Fetch<By<Vec<user::Draft>, usize>>,
        Ok = Vec<user::Draft>,
        Err = Traced<source::Error>,
    >,
    Self: Command<
        CreateUsers,
        Ok = Vec<User>,
        Err = Traced<create_users::ExecutionError>,
    >,
{
    type Ok = Vec<User>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: PopulateUsers) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let drafts = self
            .source()
            .execute(Fetch(By::new(self.config().populate_users.batch_size)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.execute(CreateUsers { drafts })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`PopulateUsers`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Upstream [`Source`] failed to provide [`user::Draft`]s.
    #[display("Upstream `Source` failed: {_0}")]
    Upstream(source::Error),

    /// [`Database`] error.
    ///
    /// [`Database`]: crate::infra::Database
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

impl From<create_users::ExecutionError> for ExecutionError {
    fn from(e: create_users::ExecutionError) -> Self {
        match e {
            create_users::ExecutionError::Db(e) => Self::Db(e),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use common::{
        operations::{By, Fetch},
        DateTime,
    };
    use tracerr::Traced;

    use crate::{
        command::populate_users,
        domain::user,
        infra::{database, source, Memory, Source},
        query::ListUsers,
        Config, Service,
    };

    use super::{Command as _, ExecutionError, PopulateUsers};

    /// [`Source`] replying with a predefined outcome.
    #[derive(Clone, Debug)]
    struct Stub {
        reply: Result<Vec<user::Draft>, u16>,
        requested: Arc<AtomicUsize>,
    }

    impl Source<Fetch<By<Vec<user::Draft>, usize>>> for Stub {
        type Ok = Vec<user::Draft>;
        type Err = Traced<source::Error>;

        async fn execute(
            &self,
            Fetch(by): Fetch<By<Vec<user::Draft>, usize>>,
        ) -> Result<Self::Ok, Self::Err> {
            self.requested.store(by.into_inner(), Ordering::SeqCst);
            self.reply
                .clone()
                .map_err(|s| tracerr::new!(source::Error::Status(s)))
        }
    }

    fn drafts(count: usize) -> Vec<user::Draft> {
        (0..count)
            .map(|n| user::Draft {
                name: format!("Mr John Doe {n}").into(),
                email: format!("john{n}@x.com").into(),
                phone: "555-0100".into(),
                cell: user::Phone::default(),
                picture: user::Picture::default(),
                registration: DateTime::now().coerce(),
            })
            .collect()
    }

    fn service(reply: Result<Vec<user::Draft>, u16>) -> Service<Memory, Stub> {
        let config = Config {
            populate_users: populate_users::Config { batch_size: 3 },
        };
        let stub = Stub {
            reply,
            requested: Arc::default(),
        };
        Service::new(config, Memory::new(), stub)
    }

    async fn stored(svc: &Service<Memory, Stub>) -> usize {
        svc.execute(ListUsers {
            limit: Some(100),
            ..ListUsers::default()
        })
        .await
        .unwrap()
        .nodes
        .len()
    }

    #[tokio::test]
    async fn persists_fetched_users() {
        let svc = service(Ok(drafts(3)));

        let created = svc.execute(PopulateUsers).await.unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(svc.source().requested.load(Ordering::SeqCst), 3);
        assert_eq!(stored(&svc).await, 3);
    }

    #[tokio::test]
    async fn reports_upstream_failure() {
        let svc = service(Err(503));

        let err = svc.execute(PopulateUsers).await.unwrap_err().into_inner();

        assert!(
            matches!(err, ExecutionError::Upstream(source::Error::Status(503))),
            "unexpected: {err}",
        );
        assert_eq!(stored(&svc).await, 0);
    }

    #[tokio::test]
    async fn reports_storage_failure_distinctly() {
        let svc = service(Ok(drafts(2)));
        svc.database().reject_commits();

        let err = svc.execute(PopulateUsers).await.unwrap_err().into_inner();

        assert!(
            matches!(err, ExecutionError::Db(database::Error::Memory(_))),
            "unexpected: {err}",
        );
        assert_eq!(stored(&svc).await, 0);
    }
}

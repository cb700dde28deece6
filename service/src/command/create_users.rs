//! [`Command`] for creating new [`User`]s in bulk.

use common::operations::{Commit, Insert, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating new [`User`]s in bulk.
///
/// Either all the [`User`]s are created, or none of them.
#[derive(Clone, Debug, Default)]
pub struct CreateUsers {
    /// [`user::Draft`]s of the new [`User`]s.
    pub drafts: Vec<user::Draft>,
}

impl<Db, Src> Command<CreateUsers> for Service<Db, Src>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'u> Database<
            Insert<&'u [User]>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<User>;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(count = cmd.drafts.len()))]
    async fn execute(&self, cmd: CreateUsers) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let users = cmd
            .drafts
            .into_iter()
            .zip(user::IdSequence::default())
            .map(|(d, id)| d.into_user(id))
            .collect::<Vec<_>>();
        if users.is_empty() {
            return Ok(users);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(users.as_slice()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!("created {} `User`s", users.len());
        Ok(users)
    }
}

/// Error of [`CreateUsers`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use std::collections::HashSet;

    use common::{pagination::DecodePolicy, DateTime};

    use crate::{
        domain::user,
        infra::{database, Memory},
        query::ListUsers,
        Config, Service,
    };

    use super::{Command as _, CreateUsers, ExecutionError};

    fn draft(email: &str) -> user::Draft {
        user::Draft {
            name: "Ms Jane Doe".into(),
            email: email.into(),
            phone: "555-0100".into(),
            cell: "555-0101".into(),
            picture: user::Picture::default(),
            registration: DateTime::now().coerce(),
        }
    }

    fn service() -> Service<Memory, ()> {
        Service::new(Config::default(), Memory::new(), ())
    }

    #[tokio::test]
    async fn creates_all_users() {
        let svc = service();

        let created = svc
            .execute(CreateUsers {
                drafts: vec![draft("a@x.com"), draft("b@x.com")],
            })
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(
            created.iter().map(|u| u.id).collect::<HashSet<_>>().len(),
            2,
        );

        let mut listed = svc
            .execute(ListUsers::default())
            .await
            .unwrap()
            .resolve(DecodePolicy::Strict)
            .unwrap();
        let mut created = created;
        listed.sort_by_key(|u| u.id);
        created.sort_by_key(|u| u.id);
        assert_eq!(listed, created);
    }

    #[tokio::test]
    async fn ids_follow_batch_order() {
        let svc = service();
        let drafts = (0..1000)
            .map(|n| draft(&format!("{n}@x.com")))
            .collect::<Vec<_>>();

        let created = svc
            .execute(CreateUsers {
                drafts: drafts.clone(),
            })
            .await
            .unwrap();

        for pair in created.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
        for (user, draft) in created.iter().zip(&drafts) {
            assert_eq!(user.email, draft.email);
        }
    }

    #[tokio::test]
    async fn creates_nothing_on_failure() {
        let svc = service();
        svc.database().reject_commits();

        let err = svc
            .execute(CreateUsers {
                drafts: vec![draft("a@x.com"), draft("b@x.com")],
            })
            .await
            .unwrap_err()
            .into_inner();
        assert!(
            matches!(err, ExecutionError::Db(database::Error::Memory(_))),
            "unexpected: {err}",
        );

        let page = svc.execute(ListUsers::default()).await.unwrap();
        assert!(page.nodes.is_empty());
        assert!(page.failures.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let svc = service();
        svc.database().reject_commits();

        let created = svc.execute(CreateUsers::default()).await.unwrap();

        assert!(created.is_empty());
    }
}

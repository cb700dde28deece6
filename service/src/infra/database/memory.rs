//! In-memory [`Database`] implementation.
//!
//! Mirrors the semantics of the [`Postgres`] one, so the [`Service`] logic can
//! be exercised without a running database.
//!
//! [`Postgres`]: super::Postgres
//! [`Service`]: crate::Service

use std::{
    iter,
    sync::{
        atomic::{self, AtomicBool},
        Arc,
    },
};

use common::{
    operations::{By, Commit, Insert, Select, Transact},
    pagination::listing_order,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, RwLock};
use tracerr::Traced;

use crate::{
    domain::User,
    infra::{database, Database},
    read::user::list,
};

/// In-memory [`Database`] storing [`list::Record`]s.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx> {
    /// Committed [`list::Record`]s.
    records: Arc<RwLock<Vec<list::Record>>>,

    /// Indicator whether [`Commit`]s should fail.
    failing: Arc<AtomicBool>,

    /// Transactional state.
    state: T,
}

/// Non-transactional [`Memory`] state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonTx;

/// Transactional [`Memory`] state.
#[derive(Clone, Debug, Default)]
pub struct Tx {
    /// [`list::Record`]s inserted but not committed yet.
    pending: Arc<Mutex<Vec<list::Record>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the provided raw [`list::Record`] as is, bypassing any
    /// validation.
    pub async fn put_record(&self, record: list::Record) {
        self.records.write().await.push(record);
    }

    /// Makes all further [`Commit`]s fail with [`Error::CommitRejected`].
    pub fn reject_commits(&self) {
        self.failing.store(true, atomic::Ordering::SeqCst);
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory {
            records: Arc::clone(&self.records),
            failing: Arc::clone(&self.failing),
            state: Tx::default(),
        })
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if self.failing.load(atomic::Ordering::SeqCst) {
            return Err(tracerr::new!(database::Error::from(
                Error::CommitRejected
            )));
        }
        let pending = std::mem::take(&mut *self.state.pending.lock().await);
        self.records.write().await.extend(pending);
        Ok(())
    }
}

impl<'u> Database<Insert<&'u [User]>> for Memory<NonTx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(users): Insert<&'u [User]>,
    ) -> Result<Self::Ok, Self::Err> {
        self.records
            .write()
            .await
            .extend(users.iter().map(list::Record::from));
        Ok(())
    }
}

impl<'u> Database<Insert<&'u [User]>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(users): Insert<&'u [User]>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state
            .pending
            .lock()
            .await
            .extend(users.iter().map(list::Record::from));
        Ok(())
    }
}

impl<T> Database<Select<By<list::Page, list::Selector>>> for Memory<T> {
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Page, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector { arguments, filter } = by.into_inner();
        let records = self.records.read().await;

        let bound = match arguments.cursor().map(ToString::to_string) {
            None => None,
            Some(cursor) => {
                let Some(at) = records.iter().find(|r| r.id == cursor) else {
                    return Ok(list::Page::new(iter::empty()));
                };
                Some((at.registration, cursor))
            }
        };

        let kind = arguments.kind();
        let mut matched = records
            .iter()
            .filter(|r| {
                filter.email.as_ref().map_or(true, |e| e.is_part_of(&r.email))
            })
            .filter(|r| {
                bound.as_ref().map_or(true, |(registration, id)| {
                    kind.admits(
                        (r.registration, r.id.as_str())
                            .cmp(&(*registration, id.as_str())),
                    )
                })
            })
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| {
            listing_order(
                &(a.registration, a.id.as_str()),
                &(b.registration, b.id.as_str()),
            )
        });

        Ok(list::decode_page(
            matched
                .into_iter()
                .take(arguments.limit().get())
                .cloned(),
        ))
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Commit`] was rejected on purpose.
    #[display("`Commit` rejected")]
    CommitRejected,
}

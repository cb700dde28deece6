//! [`User`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    pagination::{Kind, ORDER_SQL},
};
use itertools::Itertools as _;
use postgres_types::{Json, ToSql};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{
            self,
            postgres::{Connection, SubstringPattern},
            Postgres,
        },
        Database,
    },
    read::user::list,
};

impl<C> Database<Select<By<list::Page, list::Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Page, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector {
            arguments,
            filter: list::Filter { email },
        } = by.into_inner();

        let limit = i32::from(arguments.limit());

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor = arguments.cursor().map(ToString::to_string);
        let cursor_idx = cursor.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });

        let email_pattern =
            email.as_ref().map(|e| SubstringPattern::new(e.as_ref()));
        let email_idx = email_pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = list_sql(arguments.kind(), cursor_idx, email_idx);
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(list::decode_page(
            rows.into_iter().map(|row| list::Record {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                phone: row.get("phone"),
                cell: row.get("cell"),
                picture: row.get("picture"),
                registration: row.get("registration"),
            }),
        ))
    }
}

/// Composes SQL selecting a [`list::Page`].
///
/// `$1` is always the limit, while the optional cursor and email pattern are
/// bound at the provided parameter indices. No input is ever inlined.
fn list_sql(
    kind: Kind,
    cursor_idx: Option<usize>,
    email_idx: Option<usize>,
) -> String {
    format!(
        "SELECT u.id, u.name, u.email, u.phone, u.cell, \
                u.picture::TEXT AS picture, u.registration \
         FROM users AS u \
              {cursor} \
         {email} \
         ORDER BY u.registration {order}, u.id {order} \
         LIMIT $1::INT4",
        cursor = cursor_idx
            .zip(kind.operator())
            .into_iter()
            .format_with("", |(idx, op), f| {
                f(&format_args!(
                    "INNER JOIN users AS c \
                             ON c.id = ${idx}::VARCHAR \
                            AND (u.registration, u.id) \
                                {op} (c.registration, c.id)"
                ))
            }),
        email = email_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!(
                "WHERE u.email LIKE ${idx}::VARCHAR ESCAPE '{}'",
                SubstringPattern::ESCAPE,
            ))
        }),
        order = ORDER_SQL,
    )
}

impl<'u, C> Database<Insert<&'u [User]>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(users): Insert<&'u [User]>,
    ) -> Result<Self::Ok, Self::Err> {
        if users.is_empty() {
            return Ok(());
        }

        let ids = users.iter().map(|u| u.id.to_string()).collect::<Vec<_>>();
        let names = users
            .iter()
            .map(|u| AsRef::<str>::as_ref(&u.name))
            .collect::<Vec<_>>();
        let emails = users
            .iter()
            .map(|u| AsRef::<str>::as_ref(&u.email))
            .collect::<Vec<_>>();
        let phones = users
            .iter()
            .map(|u| AsRef::<str>::as_ref(&u.phone))
            .collect::<Vec<_>>();
        let cells = users
            .iter()
            .map(|u| {
                (!u.cell.is_empty()).then(|| AsRef::<str>::as_ref(&u.cell))
            })
            .collect::<Vec<_>>();
        let pictures = users
            .iter()
            .map(|u| Json::<&user::Picture>(&u.picture))
            .collect::<Vec<_>>();
        let registrations =
            users.iter().map(|u| u.registration).collect::<Vec<_>>();

        const SQL: &str = "\
            INSERT INTO users (\
                id, name, email, \
                phone, cell, \
                picture, registration\
            ) \
            SELECT * \
            FROM UNNEST(\
                $1::VARCHAR[], $2::VARCHAR[], $3::VARCHAR[], \
                $4::VARCHAR[], $5::VARCHAR[], \
                $6::JSONB[], $7::TIMESTAMPTZ[]\
            )";
        self.exec(
            SQL,
            &[
                &ids,
                &names,
                &emails,
                &phones,
                &cells,
                &pictures,
                &registrations,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

#[cfg(test)]
mod spec {
    use common::pagination::Kind;

    use super::list_sql;

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn unbounded_unfiltered() {
        let sql = squash(&list_sql(Kind::Unbounded, None, None));

        assert_eq!(
            sql,
            "SELECT u.id, u.name, u.email, u.phone, u.cell, \
             u.picture::TEXT AS picture, u.registration \
             FROM users AS u \
             ORDER BY u.registration DESC, u.id DESC \
             LIMIT $1::INT4",
        );
    }

    #[test]
    fn starting_after_reads_lesser_keys() {
        let sql = squash(&list_sql(Kind::StartingAfter, Some(2), None));

        assert!(sql.contains(
            "INNER JOIN users AS c ON c.id = $2::VARCHAR \
             AND (u.registration, u.id) < (c.registration, c.id)"
        ));
        assert!(!sql.contains("LIKE"));
    }

    #[test]
    fn ending_before_reads_greater_keys_in_same_order() {
        let sql = squash(&list_sql(Kind::EndingBefore, Some(2), Some(3)));

        assert!(sql.contains(
            "(u.registration, u.id) > (c.registration, c.id)"
        ));
        assert!(sql.contains(r"WHERE u.email LIKE $3::VARCHAR ESCAPE '\'"));
        assert!(sql.contains("ORDER BY u.registration DESC, u.id DESC"));
    }

    #[test]
    fn filter_is_bound_as_parameter() {
        let sql = squash(&list_sql(Kind::Unbounded, None, Some(2)));

        assert!(sql.contains(r"WHERE u.email LIKE $2::VARCHAR ESCAPE '\'"));
        assert!(!sql.contains("JOIN"));
    }
}

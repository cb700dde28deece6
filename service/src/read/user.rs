//! [`User`] read model definition.
//!
//! [`User`]: crate::domain::User

pub mod list {
    //! [`User`]s list definitions.

    use common::define_pagination;
    use derive_more::{AsRef, Display, Error, From};

    use crate::domain::{user, User};

    define_pagination!(Cursor, User, RowError, Filter);

    /// Cursor pointing to a specific [`User`] in a list.
    pub type Cursor = user::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Literal part of [`user::Email`] to search for.
        pub email: Option<EmailFragment>,
    }

    /// Literal, case-sensitive substring of a [`user::Email`].
    ///
    /// Never interpreted: it is matched as is and is only ever bound as a
    /// query parameter.
    #[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
    #[as_ref(str)]
    #[from(&str, String)]
    pub struct EmailFragment(String);

    impl EmailFragment {
        /// Checks whether the provided `email` contains this [`EmailFragment`].
        #[must_use]
        pub fn is_part_of(&self, email: &str) -> bool {
            email.contains(self.0.as_str())
        }
    }

    /// [`User`] row as it is persisted.
    #[derive(Clone, Debug)]
    pub struct Record {
        /// String form of the [`user::Id`].
        pub id: String,

        /// [`user::Name`].
        pub name: String,

        /// [`user::Email`].
        pub email: String,

        /// Main [`user::Phone`].
        pub phone: String,

        /// Cell [`user::Phone`], if any.
        pub cell: Option<String>,

        /// JSON-serialized [`user::Picture`].
        pub picture: String,

        /// [`user::RegistrationDateTime`].
        pub registration: user::RegistrationDateTime,
    }

    impl Record {
        /// Decodes this [`Record`] into a [`User`].
        ///
        /// # Errors
        ///
        /// If the persisted [`user::Id`] or [`user::Picture`] is malformed.
        pub fn decode(self) -> Result<User, RowError> {
            let Self {
                id,
                name,
                email,
                phone,
                cell,
                picture,
                registration,
            } = self;

            let picture = serde_json::from_str(&picture).map_err(|source| {
                RowError::MalformedPicture {
                    id: id.clone(),
                    source,
                }
            })?;
            let id = user::Id::parse(&id)?;

            Ok(User {
                id,
                name: name.into(),
                email: email.into(),
                phone: phone.into(),
                cell: cell.unwrap_or_default().into(),
                picture,
                registration,
            })
        }
    }

    impl From<&User> for Record {
        fn from(user: &User) -> Self {
            let user::Picture {
                large,
                medium,
                thumbnail,
            } = &user.picture;

            Self {
                id: user.id.to_string(),
                name: user.name.to_string(),
                email: user.email.to_string(),
                phone: user.phone.to_string(),
                cell: (!user.cell.is_empty()).then(|| user.cell.to_string()),
                picture: serde_json::json!({
                    "large": large,
                    "medium": medium,
                    "thumbnail": thumbnail,
                })
                .to_string(),
                registration: user.registration,
            }
        }
    }

    /// Error of decoding a [`Record`].
    #[derive(Debug, Display, Error, From)]
    pub enum RowError {
        /// Persisted [`user::Id`] is malformed.
        #[display("row has malformed `id`: {_0}")]
        MalformedId(user::MalformedId),

        /// Persisted [`user::Picture`] is malformed.
        #[display("row `{id}` has malformed `picture`: {source}")]
        #[from(ignore)]
        MalformedPicture {
            /// ID of the row.
            id: String,

            /// Decoding error.
            source: serde_json::Error,
        },
    }

    /// Decodes the provided [`Record`]s into a [`Page`], preserving their
    /// order.
    ///
    /// Every failed row is logged.
    pub fn decode_page(records: impl IntoIterator<Item = Record>) -> Page {
        Page::new(records.into_iter().map(|r| {
            r.decode().inspect_err(|e| {
                tracing::error!("failed to decode `User` row: {e}");
            })
        }))
    }

    #[cfg(test)]
    mod spec {
        use common::DateTime;

        use crate::domain::user;

        use super::{decode_page, EmailFragment, Record, RowError};

        fn record(id: &str, picture: &str) -> Record {
            Record {
                id: id.to_owned(),
                name: "Mr John Doe".to_owned(),
                email: "john@x.com".to_owned(),
                phone: "123-456".to_owned(),
                cell: None,
                picture: picture.to_owned(),
                registration: DateTime::now().coerce(),
            }
        }

        const ID: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";

        #[test]
        fn decodes_row() {
            let user = record(ID, r#"{"large":"l","medium":"m","thumbnail":"t"}"#)
                .decode()
                .unwrap();

            assert_eq!(user.id.to_string(), ID);
            assert_eq!(user.name.to_string(), "Mr John Doe");
            assert_eq!(user.picture.large, "l");
            assert_eq!(user.picture.thumbnail, "t");
        }

        #[test]
        fn absent_cell_is_empty() {
            let user = record(ID, "{}").decode().unwrap();

            assert!(user.cell.is_empty());
        }

        #[test]
        fn reports_malformed_picture() {
            let err = record(ID, "{not json").decode().unwrap_err();

            assert!(
                matches!(&err, RowError::MalformedPicture { id, .. } if id == ID),
                "unexpected: {err}",
            );
        }

        #[test]
        fn reports_malformed_id() {
            let err = record("nope", "{}").decode().unwrap_err();

            assert!(matches!(err, RowError::MalformedId(_)), "{err}");
        }

        #[test]
        fn encodes_back_into_same_row() {
            let mut rec = record(ID, "{}");
            rec.cell = Some("555".to_owned());
            let user = rec.clone().decode().unwrap();

            let encoded = Record::from(&user);
            assert_eq!(encoded.id, rec.id);
            assert_eq!(encoded.cell.as_deref(), Some("555"));
            assert_eq!(encoded.decode().unwrap(), user);
        }

        #[test]
        fn page_drops_only_broken_rows() {
            let page = decode_page([
                record(ID, "{}"),
                record("broken", "{}"),
                record("01BX5ZZKBKACTAV9WEVGEMMVRZ", "42"),
            ]);

            assert_eq!(page.nodes.len(), 1);
            assert_eq!(page.failures.len(), 2);
            assert_eq!(page.nodes[0].id, user::Id::parse(ID).unwrap());
        }

        #[test]
        fn email_fragment_is_literal() {
            let fragment = EmailFragment::from("_");

            assert!(!fragment.is_part_of("john@x.com"));
            assert!(fragment.is_part_of("john_doe@x.com"));
            assert!(EmailFragment::from("oh").is_part_of("john@x.com"));
            assert!(!EmailFragment::from("OH").is_part_of("john@x.com"));
        }
    }
}

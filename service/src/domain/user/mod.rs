//! [`User`] definitions.

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Registered user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// [`Email`] of this [`User`].
    pub email: Email,

    /// Main [`Phone`] of this [`User`].
    pub phone: Phone,

    /// Cell [`Phone`] of this [`User`].
    ///
    /// Empty if this [`User`] has none.
    pub cell: Phone,

    /// [`Picture`] of this [`User`].
    pub picture: Picture,

    /// [`DateTime`] when this [`User`] was registered.
    ///
    /// Independent of the creation instant embedded into the [`Id`]: it may
    /// be backfilled with historical values.
    pub registration: RegistrationDateTime,
}

impl User {
    /// Returns the [`SortKey`] of this [`User`].
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            registration: self.registration,
            id: self.id,
        }
    }
}

/// Position of a [`User`] in the listing order.
///
/// Compares by [`registration`] first and by [`id`] for equal
/// registrations. [`User`]s are listed in descending [`SortKey`] order.
///
/// [`id`]: User::id
/// [`registration`]: User::registration
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct SortKey {
    /// [`DateTime`] when the [`User`] was registered.
    pub registration: RegistrationDateTime,

    /// ID of the [`User`].
    pub id: Id,
}

/// Data of a [`User`] not persisted yet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// [`Name`] of the [`User`].
    pub name: Name,

    /// [`Email`] of the [`User`].
    pub email: Email,

    /// Main [`Phone`] of the [`User`].
    pub phone: Phone,

    /// Cell [`Phone`] of the [`User`], empty if none.
    pub cell: Phone,

    /// [`Picture`] of the [`User`].
    pub picture: Picture,

    /// [`DateTime`] when the [`User`] was registered.
    pub registration: RegistrationDateTime,
}

impl Draft {
    /// Turns this [`Draft`] into a [`User`] identified by the provided [`Id`].
    #[must_use]
    pub fn into_user(self, id: Id) -> User {
        let Self {
            name,
            email,
            phone,
            cell,
            picture,
            registration,
        } = self;
        User {
            id,
            name,
            email,
            phone,
            cell,
            picture,
            registration,
        }
    }
}

/// ID of a [`User`].
///
/// Lexically sortable: the canonical string form starts with the millisecond
/// of creation, so both [`Ord`] and the string byte order follow the creation
/// order.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Id(Ulid);

impl Id {
    /// Creates a new unique [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parses an [`Id`] out of its string form.
    ///
    /// # Errors
    ///
    /// With [`MalformedId`] if the `input` is not a valid [`Id`].
    pub fn parse(input: &str) -> Result<Self, MalformedId> {
        Ulid::from_string(input).map(Self).map_err(|source| MalformedId {
            input: input.to_owned(),
            source,
        })
    }

    /// Returns the Unix timestamp (in milliseconds) this [`Id`] was created
    /// at.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

/// Endless sequence of strictly increasing [`Id`]s.
///
/// [`Id::new`] is random within a millisecond, so [`Id`]s created in a burst
/// may not follow their creation order. [`Id`]s of a single [`IdSequence`]
/// always do.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdSequence {
    /// Last yielded [`Ulid`].
    last: Option<Ulid>,
}

impl Iterator for IdSequence {
    type Item = Id;

    fn next(&mut self) -> Option<Self::Item> {
        let fresh = Ulid::new();
        let next = match self.last {
            Some(last) if fresh <= last => last.increment().unwrap_or_else(
                || Ulid::from_parts(last.timestamp_ms() + 1, 0),
            ),
            Some(_) | None => fresh,
        };
        self.last = Some(next);
        Some(Id(next))
    }
}

impl FromStr for Id {
    type Err = MalformedId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error of parsing an [`Id`].
#[derive(Clone, Debug, Display, Error)]
#[display("malformed `Id` `{input}`: {source}")]
pub struct MalformedId {
    /// Input failed to parse.
    pub input: String,

    /// Parsing error.
    pub source: ulid::DecodeError,
}

/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

/// Phone number of a [`User`].
#[derive(AsRef, Clone, Debug, Default, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Indicates whether this [`Phone`] is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// URLs of a [`User`] picture by its size.
///
/// Missing sizes are decoded as empty strings.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Picture {
    /// URL of the large picture.
    pub large: String,

    /// URL of the medium picture.
    pub medium: String,

    /// URL of the thumbnail picture.
    pub thumbnail: String,
}

/// [`DateTime`] when a [`User`] was registered.
pub type RegistrationDateTime = DateTimeOf<(User, unit::Registration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use super::{Id, IdSequence, Picture, SortKey};

    #[test]
    fn parses_canonical_form() {
        let id = Id::new();

        assert_eq!(Id::parse(&id.to_string()).unwrap(), id);
        assert_eq!(id.to_string().len(), 26);
    }

    #[test]
    fn parse_is_case_insensitive_and_canonicalizes() {
        let raw = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
        let id = Id::parse(&raw.to_lowercase()).unwrap();

        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn rejects_malformed() {
        for raw in ["", "not-an-id", "01ARZ3NDEKTSV4RRFFQ69G5FA", "'; DROP"] {
            let err = Id::parse(raw).unwrap_err();
            assert_eq!(err.input, raw);
        }
        assert!("01ARZ3NDEKTSV4RRFFQ69G5FAVX".parse::<Id>().is_err());
    }

    #[test]
    fn ordering_follows_string_order() {
        let ids = [
            "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "01BX5ZZKBKACTAV9WEVGEMMVRZ",
            "01BX5ZZKBKACTAV9WEVGEMMVS0",
            "7ZZZZZZZZZZZZZZZZZZZZZZZZZ",
        ]
        .map(|raw| Id::parse(raw).unwrap());

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn sequence_follows_creation_order() {
        let ids = IdSequence::default().take(10_000).collect::<Vec<_>>();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} >= {}", pair[0], pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn sequence_is_not_behind_the_clock() {
        let before = Id::new().timestamp_ms();
        let id = IdSequence::default().next().unwrap();

        assert!(id.timestamp_ms() >= before);
    }

    #[test]
    fn embeds_creation_instant() {
        let id = Id::parse("01ARZ3NDEKTSV4RRFFQ69G5FAV").unwrap();

        assert_eq!(id.timestamp_ms(), 1_469_922_850_259);
    }

    #[test]
    fn sort_key_breaks_ties_by_id() {
        let at = DateTime::now().coerce();
        let (lo, hi) = {
            let a = Id::parse("01ARZ3NDEKTSV4RRFFQ69G5FAV").unwrap();
            let b = Id::parse("01BX5ZZKBKACTAV9WEVGEMMVRZ").unwrap();
            (a, b)
        };

        let earlier = SortKey {
            registration: at - Duration::from_secs(1),
            id: hi,
        };
        let tied_lo = SortKey {
            registration: at,
            id: lo,
        };
        let tied_hi = SortKey {
            registration: at,
            id: hi,
        };

        assert!(earlier < tied_lo);
        assert!(tied_lo < tied_hi);
    }

    #[test]
    fn picture_tolerates_missing_sizes() {
        let picture: Picture =
            serde_json::from_str(r#"{"large": "https://x/l.jpg"}"#).unwrap();

        assert_eq!(picture.large, "https://x/l.jpg");
        assert_eq!(picture.medium, "");
        assert_eq!(picture.thumbnail, "");

        assert!(serde_json::from_str::<Picture>(r#"["nope"]"#).is_err());
        assert!(serde_json::from_str::<Picture>(r#"{"large": 1}"#).is_err());
    }
}

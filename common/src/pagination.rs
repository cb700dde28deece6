//! Abstractions for keyset pagination.
//!
//! A page is always read in the descending composite order of its items, and
//! is bounded (exclusively) by at most one cursor: either everything
//! [`Kind::StartingAfter`] the cursor, or everything [`Kind::EndingBefore`] it.

use std::{cmp::Ordering, fmt};

use derive_more::{Display, Error};

/// Number of items requested in a page.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct Limit(u8);

impl Limit {
    /// Smallest allowed [`Limit`].
    pub const MIN: Self = Self(1);

    /// Largest allowed [`Limit`].
    pub const MAX: Self = Self(100);

    /// [`Limit`] applied when none is requested.
    pub const DEFAULT: Self = Self(10);

    /// Creates a new [`Limit`] if the provided `value` is within
    /// [`Limit::MIN`]..=[`Limit::MAX`].
    ///
    /// # Errors
    ///
    /// With [`ArgumentsError::LimitOutOfRange`] if the `value` is out of range.
    pub fn new(value: i64) -> Result<Self, ArgumentsError> {
        u8::try_from(value)
            .ok()
            .map(Self)
            .filter(|l| (Self::MIN..=Self::MAX).contains(l))
            .ok_or(ArgumentsError::LimitOutOfRange(value))
    }

    /// Returns this [`Limit`] as a [`usize`].
    #[must_use]
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Limit> for i32 {
    fn from(limit: Limit) -> Self {
        Self::from(limit.0)
    }
}

/// Pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arguments<C> {
    /// First page, not bounded by any cursor.
    Unbounded {
        /// Number of items to return.
        limit: Limit,
    },

    /// Page of items strictly after the `cursor`.
    StartingAfter {
        /// Number of items to return.
        limit: Limit,

        /// Cursor after which to return items.
        cursor: C,
    },

    /// Page of items strictly before the `cursor`.
    EndingBefore {
        /// Number of items to return.
        limit: Limit,

        /// Cursor before which to return items.
        cursor: C,
    },
}

impl<C> Arguments<C> {
    /// Creates new [`Arguments`] out of the raw request values.
    ///
    /// [`Limit::DEFAULT`] is used if no `limit` is provided.
    ///
    /// # Errors
    ///
    /// - [`ArgumentsError::LimitOutOfRange`] if the `limit` is out of range;
    /// - [`ArgumentsError::AmbiguousCursors`] if both `starting_after` and
    ///   `ending_before` are provided.
    pub fn new(
        limit: Option<i64>,
        starting_after: Option<C>,
        ending_before: Option<C>,
    ) -> Result<Self, ArgumentsError> {
        let limit = limit.map(Limit::new).transpose()?.unwrap_or_default();
        Ok(match (starting_after, ending_before) {
            (None, None) => Self::Unbounded { limit },
            (Some(cursor), None) => Self::StartingAfter { limit, cursor },
            (None, Some(cursor)) => Self::EndingBefore { limit, cursor },
            (Some(_), Some(_)) => {
                return Err(ArgumentsError::AmbiguousCursors);
            }
        })
    }

    /// Returns cursor requested by these [`Arguments`], if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        match self {
            Self::Unbounded { .. } => None,
            Self::StartingAfter { cursor, .. }
            | Self::EndingBefore { cursor, .. } => Some(cursor),
        }
    }

    /// Returns [`Kind`] of pagination these [`Arguments`] request.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Unbounded { .. } => Kind::Unbounded,
            Self::StartingAfter { .. } => Kind::StartingAfter,
            Self::EndingBefore { .. } => Kind::EndingBefore,
        }
    }

    /// Returns [`Limit`] requested by these [`Arguments`].
    #[must_use]
    pub fn limit(&self) -> Limit {
        match *self {
            Self::Unbounded { limit }
            | Self::StartingAfter { limit, .. }
            | Self::EndingBefore { limit, .. } => limit,
        }
    }
}

/// Error of constructing [`Arguments`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ArgumentsError {
    /// Requested limit is out of range.
    #[display(
        "limit must be between {} and {}, got {_0}",
        Limit::MIN,
        Limit::MAX
    )]
    LimitOutOfRange(#[error(not(source))] i64),

    /// Both `starting_after` and `ending_before` are provided.
    #[display("only one of `starting_after` and `ending_before` can be used")]
    AmbiguousCursors,
}

/// Pagination selector.
#[derive(Clone, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Kind of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// No cursor bound.
    Unbounded,

    /// Items strictly after the cursor in the [`listing_order()`].
    StartingAfter,

    /// Items strictly before the cursor in the [`listing_order()`].
    EndingBefore,
}

impl Kind {
    /// Returns comparison operator to apply to an item sort key against the
    /// cursor sort key, if any.
    ///
    /// Since items are listed in descending [`listing_order()`], "after" the
    /// cursor means "less than" it.
    #[must_use]
    pub const fn operator(&self) -> Option<&'static str> {
        match self {
            Self::Unbounded => None,
            Self::StartingAfter => Some("<"),
            Self::EndingBefore => Some(">"),
        }
    }

    /// Checks whether an item is admitted by this [`Kind`] of bound, given
    /// the [`Ordering`] of the item sort key against the cursor sort key.
    #[must_use]
    pub fn admits(&self, item_to_cursor: Ordering) -> bool {
        match self {
            Self::Unbounded => true,
            Self::StartingAfter => item_to_cursor == Ordering::Less,
            Self::EndingBefore => item_to_cursor == Ordering::Greater,
        }
    }
}

/// SQL keyword of the order pages are read in, regardless of their [`Kind`].
pub const ORDER_SQL: &str = "DESC";

/// Compares sort keys of two items the way pages list them: descending,
/// regardless of the page [`Kind`].
#[must_use]
pub fn listing_order<K: Ord + ?Sized>(a: &K, b: &K) -> Ordering {
    b.cmp(a)
}

/// Policy of treating items which failed to decode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum DecodePolicy {
    /// Failed items are dropped, so the page may be shorter than requested.
    #[default]
    Lossy,

    /// Any failed item fails the whole page.
    Strict,
}

/// Page of decoded items along with the items failed to decode.
#[derive(Clone, Debug)]
pub struct Page<I, E> {
    /// Successfully decoded items, in the [`listing_order()`].
    pub nodes: Vec<I>,

    /// Items failed to decode, in the [`listing_order()`].
    pub failures: Vec<E>,
}

impl<I, E> Page<I, E> {
    /// Creates a new [`Page`] out of the decoded `rows`, preserving their
    /// order.
    #[must_use]
    pub fn new(rows: impl IntoIterator<Item = Result<I, E>>) -> Self {
        let (mut nodes, mut failures) = (vec![], vec![]);
        for row in rows {
            match row {
                Ok(node) => nodes.push(node),
                Err(e) => failures.push(e),
            }
        }
        Self { nodes, failures }
    }

    /// Indicates whether all the rows of this [`Page`] were decoded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Resolves this [`Page`] into its items according to the provided
    /// [`DecodePolicy`].
    ///
    /// # Errors
    ///
    /// With [`IncompletePage`] if the [`DecodePolicy::Strict`] is requested
    /// and some rows failed to decode.
    pub fn resolve(
        self,
        policy: DecodePolicy,
    ) -> Result<Vec<I>, IncompletePage<E>> {
        match policy {
            DecodePolicy::Strict if !self.is_complete() => {
                Err(IncompletePage {
                    failures: self.failures,
                })
            }
            DecodePolicy::Lossy | DecodePolicy::Strict => Ok(self.nodes),
        }
    }
}

/// Error of resolving a [`Page`] with [`DecodePolicy::Strict`].
#[derive(Clone, Debug)]
pub struct IncompletePage<E> {
    /// Items failed to decode.
    pub failures: Vec<E>,
}

impl<E: fmt::Display> fmt::Display for IncompletePage<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.failures.len();
        write!(f, "{count} row(s) of the page failed to decode")?;
        if let Some(first) = self.failures.first() {
            write!(f, ", first: {first}")?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for IncompletePage<E> {}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $failure:ty, $filter:ty) => {
        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;

        #[doc = "A [`Page`] of decoded nodes and failed rows."]
        pub type Page = $crate::pagination::Page<$node, $failure>;
    };
}

#[cfg(test)]
mod spec {
    use std::cmp::Ordering;

    use super::{
        listing_order, Arguments, ArgumentsError, DecodePolicy, Kind, Limit,
        Page, ORDER_SQL,
    };

    #[test]
    fn limit_bounds() {
        assert_eq!(Limit::new(1).unwrap().get(), 1);
        assert_eq!(Limit::new(100).unwrap().get(), 100);

        assert_eq!(Limit::new(0), Err(ArgumentsError::LimitOutOfRange(0)));
        assert_eq!(Limit::new(101), Err(ArgumentsError::LimitOutOfRange(101)));
        assert_eq!(Limit::new(-5), Err(ArgumentsError::LimitOutOfRange(-5)));
        assert_eq!(
            Limit::new(i64::MAX),
            Err(ArgumentsError::LimitOutOfRange(i64::MAX)),
        );
    }

    #[test]
    fn default_limit() {
        let args = Arguments::<u8>::new(None, None, None).unwrap();
        assert_eq!(args.limit(), Limit::DEFAULT);
        assert_eq!(args.limit().get(), 10);
        assert_eq!(args.kind(), Kind::Unbounded);
        assert_eq!(args.cursor(), None);
    }

    #[test]
    fn cursors_are_exclusive() {
        assert_eq!(
            Arguments::new(Some(5), Some(1), Some(2)),
            Err(ArgumentsError::AmbiguousCursors),
        );

        let after = Arguments::new(Some(5), Some(1), None).unwrap();
        assert_eq!(after.kind(), Kind::StartingAfter);
        assert_eq!(after.cursor(), Some(&1));

        let before = Arguments::new(None, None, Some(2)).unwrap();
        assert_eq!(before.kind(), Kind::EndingBefore);
        assert_eq!(before.cursor(), Some(&2));
    }

    #[test]
    fn limit_is_validated_before_cursors() {
        assert_eq!(
            Arguments::new(Some(0), Some(1), Some(2)),
            Err(ArgumentsError::LimitOutOfRange(0)),
        );
    }

    #[test]
    fn kind_admits() {
        assert!(Kind::Unbounded.admits(Ordering::Equal));
        assert!(Kind::StartingAfter.admits(Ordering::Less));
        assert!(!Kind::StartingAfter.admits(Ordering::Equal));
        assert!(!Kind::StartingAfter.admits(Ordering::Greater));
        assert!(Kind::EndingBefore.admits(Ordering::Greater));
        assert!(!Kind::EndingBefore.admits(Ordering::Equal));
        assert!(!Kind::EndingBefore.admits(Ordering::Less));
    }

    #[test]
    fn lists_in_descending_order() {
        assert_eq!(listing_order(&1, &2), Ordering::Greater);
        assert_eq!(listing_order(&(5, "a"), &(5, "b")), Ordering::Greater);
        assert_eq!(listing_order(&2, &2), Ordering::Equal);
        assert_eq!(ORDER_SQL, "DESC");

        let mut keys = [(1, "b"), (2, "a"), (1, "c")];
        keys.sort_by(listing_order);
        assert_eq!(keys, [(2, "a"), (1, "c"), (1, "b")]);
    }

    #[test]
    fn page_keeps_order_and_failures() {
        let page = Page::new([Ok(3), Err("bad"), Ok(2), Ok(1)]);

        assert_eq!(page.nodes, [3, 2, 1]);
        assert_eq!(page.failures, ["bad"]);
        assert!(!page.is_complete());

        assert_eq!(
            page.clone().resolve(DecodePolicy::Lossy).unwrap(),
            [3, 2, 1],
        );

        let err = page.resolve(DecodePolicy::Strict).unwrap_err();
        assert_eq!(err.failures, ["bad"]);
        assert_eq!(
            err.to_string(),
            "1 row(s) of the page failed to decode, first: bad",
        );
    }

    #[test]
    fn complete_page_resolves_strictly() {
        let page = Page::<_, &str>::new([Ok(1)]);

        assert_eq!(page.resolve(DecodePolicy::Strict).unwrap(), [1]);
    }
}

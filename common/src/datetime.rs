//! Date and time utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, marker::PhantomData, ops, time::Duration};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{
    format_description::well_known::Rfc3339, macros::format_description,
    Date, Month, UtcOffset,
};

/// Untyped date and time.
pub type DateTime = DateTimeOf;

/// UTC date and time, tagged with the kind of moment it describes.
///
/// The `Of` parameter never exists at runtime: it only prevents mixing up,
/// for example, a lease start with a payment date.
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Inner representation of the date and time.
    inner: time::OffsetDateTime,

    /// Type parameter describing the kind of date and time.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// A [`DateTime`] representing the Unix epoch.
    pub const UNIX_EPOCH: Self = Self::wrap(time::OffsetDateTime::UNIX_EPOCH);

    /// Wraps the provided [`time::OffsetDateTime`] as is.
    const fn wrap(inner: time::OffsetDateTime) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }

    /// Creates a new [`DateTime`] representing the current date and time,
    /// truncated to microseconds (the precision of the database).
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn now() -> Self {
        let inner = time::OffsetDateTime::now_utc();
        Self::wrap(
            inner
                .replace_microsecond(inner.microsecond())
                .expect("infallible"),
        )
    }

    /// Creates a new [`DateTime`] from the provided [`UNIX_EPOCH`] timestamp.
    ///
    /// [`None`] is returned if the timestamp is invalid.
    ///
    /// [`UNIX_EPOCH`]: Self::UNIX_EPOCH
    #[must_use]
    pub fn from_unix_timestamp(timestamp: i64) -> Option<Self> {
        time::OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .map(Self::wrap)
    }

    /// Returns the [`UNIX_EPOCH`] timestamp of this [`DateTime`].
    ///
    /// [`UNIX_EPOCH`]: Self::UNIX_EPOCH
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.inner.unix_timestamp()
    }

    /// Creates a new [`DateTime`] from the provided [RFC 3339] string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid [RFC 3339] date and time.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub fn from_rfc3339(input: &str) -> Result<Self, ParseError> {
        use ParseError as E;

        time::OffsetDateTime::parse(input, &Rfc3339)
            .map_err(E::Parse)?
            .try_into()
            .map_err(E::ComponentRange)
    }

    /// Returns the [`DateTime`] as an [RFC 3339] string.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.inner.format(&Rfc3339).unwrap_or_else(|e| {
            panic!("cannot format `DateTime` as RFC 3339: {e}")
        })
    }

    /// Returns the calendar date of this [`DateTime`] in a form suitable for
    /// people, like `October 18, 2026`.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_human_date(&self) -> String {
        self.inner
            .format(format_description!(
                "[month repr:long] [day padding:none], [year]"
            ))
            .unwrap_or_else(|e| {
                panic!("cannot format `DateTime` as a date: {e}")
            })
    }

    /// Advances this [`DateTime`] by the provided number of calendar months,
    /// keeping the time of day.
    ///
    /// If the resulting month is shorter than the day of this [`DateTime`],
    /// the last day of that month is used (January 31 plus one month is the
    /// last day of February).
    ///
    /// [`None`] is returned if the result is out of the supported range.
    #[must_use]
    pub fn checked_add_months(self, months: u32) -> Option<Self> {
        let date = self.inner.date();
        let index = i64::from(date.year()) * 12
            + i64::from(u8::from(date.month()))
            - 1
            + i64::from(months);

        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month =
            Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?)
                .ok()?;
        let date = (1..=date.day())
            .rev()
            .find_map(|day| Date::from_calendar_date(year, month, day).ok())?;

        Some(Self::wrap(self.inner.replace_date(date)))
    }

    /// Returns the number of whole days from this [`DateTime`] until the
    /// `later` one, where any started day counts as a whole one.
    ///
    /// Negative if `later` is actually in the past.
    #[must_use]
    pub fn days_until<Other: ?Sized>(&self, later: DateTimeOf<Other>) -> i64 {
        let diff = later.inner - self.inner;
        let days = diff.whole_days();
        if diff > time::Duration::days(days) {
            days + 1
        } else {
            days
        }
    }

    /// Coerces one kind of [`DateTime`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf::wrap(self.inner)
    }
}

/// Error of parsing [`DateTime`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// Failed to parse the string into an [`DateTime`].
    Parse(time::error::Parse),

    /// Parsed [`DateTime`] has an out of range component.
    ComponentRange(time::error::ComponentRange),
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> TryFrom<time::OffsetDateTime> for DateTimeOf<Of> {
    type Error = time::error::ComponentRange;

    fn try_from(dt: time::OffsetDateTime) -> Result<Self, Self::Error> {
        dt.to_offset(UtcOffset::UTC)
            .replace_microsecond(dt.microsecond())
            .map(Self::wrap)
    }
}

impl<Of: ?Sized> From<DateTimeOf<Of>> for time::OffsetDateTime {
    fn from(dt: DateTimeOf<Of>) -> Self {
        dt.inner
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::wrap(self.inner + rhs)
    }
}

impl<Of: ?Sized> ops::Sub<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::wrap(self.inner - rhs)
    }
}

/// Saturates at [`Duration::ZERO`] if `rhs` is later than `self`.
impl<Of: ?Sized> ops::Sub for DateTimeOf<Of> {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        (self.inner - rhs.inner).try_into().unwrap_or(Duration::ZERO)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw)?
            .try_into()
            .map_err(Box::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! Module providing integration with [`serde`] crate.

    use super::DateTimeOf;

    pub mod unix_timestamp {
        //! Module providing serialization and deserialization of [`DateTimeOf`]
        //! as a Unix timestamp.

        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        use super::DateTimeOf;

        /// Serializes the [`DateTimeOf`] as a Unix timestamp.
        ///
        /// # Errors
        ///
        /// Returns an error if the timestamp is invalid.
        pub fn serialize<Of, S>(
            dt: &DateTimeOf<Of>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            Of: ?Sized,
        {
            serializer.serialize_i64(dt.unix_timestamp())
        }

        /// Deserializes the Unix timestamp into a [`DateTimeOf`].
        ///
        /// # Errors
        ///
        /// Returns an error if the timestamp is invalid.
        pub fn deserialize<'de, D, Of>(
            deserializer: D,
        ) -> Result<DateTimeOf<Of>, D::Error>
        where
            D: Deserializer<'de>,
            Of: ?Sized,
        {
            DateTimeOf::from_unix_timestamp(i64::deserialize(deserializer)?)
                .ok_or_else(|| Error::custom("invalid timestamp"))
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Date and time in a [RFC 3339] format with a microsecond precision.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[graphql_scalar(with = Self, parse_token(String))]
    type DateTime = crate::DateTime;

    impl DateTime {
        fn to_output<S: ScalarValue>(dt: &DateTime) -> Value<S> {
            Value::scalar(dt.to_rfc3339())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `DateTime` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_rfc3339(s).map_err(|e| {
                        format!("Cannot parse `DateTime` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::DateTime;

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    #[test]
    fn adds_months_keeping_time_of_day() {
        assert_eq!(
            at("2026-01-15T10:30:00Z").checked_add_months(1),
            Some(at("2026-02-15T10:30:00Z")),
        );
        assert_eq!(
            at("2026-01-15T10:30:00Z").checked_add_months(3),
            Some(at("2026-04-15T10:30:00Z")),
        );
        assert_eq!(
            at("2026-11-01T00:00:00Z").checked_add_months(2),
            Some(at("2027-01-01T00:00:00Z")),
        );
        assert_eq!(
            at("2026-05-20T08:00:00Z").checked_add_months(0),
            Some(at("2026-05-20T08:00:00Z")),
        );
    }

    #[test]
    fn clamps_to_end_of_shorter_month() {
        assert_eq!(
            at("2026-01-31T12:00:00Z").checked_add_months(1),
            Some(at("2026-02-28T12:00:00Z")),
        );
        assert_eq!(
            at("2028-01-31T12:00:00Z").checked_add_months(1),
            Some(at("2028-02-29T12:00:00Z")),
        );
        assert_eq!(
            at("2026-03-31T12:00:00Z").checked_add_months(1),
            Some(at("2026-04-30T12:00:00Z")),
        );
    }

    #[test]
    fn counts_started_days_as_whole() {
        let now = at("2026-10-18T12:00:00Z");

        assert_eq!(now.days_until(now), 0);
        assert_eq!(now.days_until(at("2026-10-19T12:00:00Z")), 1);
        assert_eq!(now.days_until(at("2026-10-19T12:00:01Z")), 2);
        assert_eq!(now.days_until(at("2026-10-18T12:00:01Z")), 1);
        assert_eq!(now.days_until(at("2026-10-17T12:00:00Z")), -1);
        assert_eq!(now.days_until(at("2026-10-18T00:00:00Z")), 0);
    }

    #[test]
    fn formats_human_date() {
        assert_eq!(at("2026-10-08T23:59:59Z").to_human_date(), "October 8, 2026");
        assert_eq!(at("2027-01-31T00:00:00Z").to_human_date(), "January 31, 2027");
    }

    #[test]
    fn subtraction_saturates() {
        let earlier = at("2026-10-18T12:00:00Z");
        let later = earlier + Duration::from_secs(90);

        assert_eq!(later - earlier, Duration::from_secs(90));
        assert_eq!(earlier - later, Duration::ZERO);
    }
}

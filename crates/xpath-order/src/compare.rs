//! Ordering policies for sort keys.
//!
//! A comparer is bound once (collation, implicit timezone) and then used as a
//! context-free function for the lifetime of one sort or one grouping. An
//! absent operand models the empty sequence.

use crate::collation::Collation;
use crate::xdm::XdmAtomicValue;
use chrono::{FixedOffset, NaiveDate, NaiveTime, Timelike};
use core::cmp::Ordering;
use std::sync::Arc;

/// Two values whose types cannot be ordered against each other.
///
/// Carries no error code: the caller decides which host-specific code the
/// failure is reported under.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot compare {left} with {right}")]
pub struct ClassificationError {
    pub left: &'static str,
    pub right: &'static str,
}

impl ClassificationError {
    pub fn new(left: &'static str, right: &'static str) -> Self {
        Self { left, right }
    }

    fn between(a: &XdmAtomicValue, b: &XdmAtomicValue) -> Self {
        Self::new(a.type_name(), b.type_name())
    }
}

pub trait AtomicComparer: Send + Sync {
    fn compare(
        &self,
        a: Option<&XdmAtomicValue>,
        b: Option<&XdmAtomicValue>,
    ) -> Result<Ordering, ClassificationError>;

    fn equals(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<bool, ClassificationError> {
        Ok(self.compare(Some(a), Some(b))? == Ordering::Equal)
    }
}

// Empty sorts before everything; `None` when both are present.
fn compare_empty(a: Option<&XdmAtomicValue>, b: Option<&XdmAtomicValue>) -> Option<Ordering> {
    match (a, b) {
        (None, None) => Some(Ordering::Equal),
        (None, Some(_)) => Some(Ordering::Less),
        (Some(_), None) => Some(Ordering::Greater),
        (Some(_), Some(_)) => None,
    }
}

/// Total order on doubles for sorting: NaN equals NaN and precedes every
/// other number.
pub(crate) fn compare_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_numeric(a: &XdmAtomicValue, b: &XdmAtomicValue) -> Option<Ordering> {
    if let (XdmAtomicValue::Integer(x), XdmAtomicValue::Integer(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    Some(compare_doubles(a.as_f64()?, b.as_f64()?))
}

/// Seconds and nanoseconds since the epoch of midnight starting `date` in its
/// own timezone, or the implicit one.
pub(crate) fn date_instant(date: NaiveDate, tz: Option<FixedOffset>, implicit: FixedOffset) -> (i64, u32) {
    let offset = tz.unwrap_or(implicit);
    let local = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    (local - i64::from(offset.local_minus_utc()), 0)
}

/// A time anchored on a fixed reference day, normalized to UTC.
pub(crate) fn time_instant(time: NaiveTime, tz: Option<FixedOffset>, implicit: FixedOffset) -> (i64, u32) {
    let offset = tz.unwrap_or(implicit);
    let secs = i64::from(time.num_seconds_from_midnight()) - i64::from(offset.local_minus_utc());
    (secs, time.nanosecond())
}

/// The default comparison policy of `xsl:sort` and `fn:sort`.
///
/// Numbers compare across numeric types, string-like values under the bound
/// collation, and temporal values after timezone normalization. Pairs outside
/// one comparable family are a [`ClassificationError`].
pub struct AtomicSortComparer {
    collation: Arc<dyn Collation>,
    implicit_timezone: FixedOffset,
}

impl AtomicSortComparer {
    pub fn new(collation: Arc<dyn Collation>, implicit_timezone: FixedOffset) -> Self {
        Self {
            collation,
            implicit_timezone,
        }
    }

    fn compare_present(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<Ordering, ClassificationError> {
        use XdmAtomicValue as V;
        if a.is_numeric() && b.is_numeric() {
            return compare_numeric(a, b).ok_or_else(|| ClassificationError::between(a, b));
        }
        if a.is_string_like() && b.is_string_like() {
            return Ok(self.collation.compare(&a.string_value(), &b.string_value()));
        }
        let tz = self.implicit_timezone;
        let ord = match (a, b) {
            (V::Boolean(x), V::Boolean(y)) => x.cmp(y),
            (V::DateTime(x), V::DateTime(y)) => (x.timestamp(), x.timestamp_subsec_nanos())
                .cmp(&(y.timestamp(), y.timestamp_subsec_nanos())),
            (V::Date { date: da, tz: ta }, V::Date { date: db, tz: tb }) => {
                date_instant(*da, *ta, tz).cmp(&date_instant(*db, *tb, tz))
            }
            (V::Time { time: xa, tz: ta }, V::Time { time: xb, tz: tb }) => {
                time_instant(*xa, *ta, tz).cmp(&time_instant(*xb, *tb, tz))
            }
            (V::YearMonthDuration(x), V::YearMonthDuration(y)) => x.cmp(y),
            (V::DayTimeDuration(x), V::DayTimeDuration(y)) => x.cmp(y),
            _ => return Err(ClassificationError::between(a, b)),
        };
        Ok(ord)
    }
}

impl AtomicComparer for AtomicSortComparer {
    fn compare(
        &self,
        a: Option<&XdmAtomicValue>,
        b: Option<&XdmAtomicValue>,
    ) -> Result<Ordering, ClassificationError> {
        match (a, b) {
            (Some(x), Some(y)) => self.compare_present(x, y),
            _ => Ok(compare_empty(a, b).unwrap_or(Ordering::Equal)),
        }
    }

    fn equals(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<bool, ClassificationError> {
        // QName has equality but no order; prefix is not significant
        if let (
            XdmAtomicValue::QName { ns_uri: na, local: la, .. },
            XdmAtomicValue::QName { ns_uri: nb, local: lb, .. },
        ) = (a, b)
        {
            return Ok(na == nb && la == lb);
        }
        Ok(self.compare_present(a, b)? == Ordering::Equal)
    }
}

/// `data-type="number"`: both operands are converted to `xs:double`; values
/// that do not convert become NaN. Never fails.
pub struct NumericComparer;

impl AtomicComparer for NumericComparer {
    fn compare(
        &self,
        a: Option<&XdmAtomicValue>,
        b: Option<&XdmAtomicValue>,
    ) -> Result<Ordering, ClassificationError> {
        match (a, b) {
            (Some(x), Some(y)) => Ok(compare_doubles(x.to_double(), y.to_double())),
            _ => Ok(compare_empty(a, b).unwrap_or(Ordering::Equal)),
        }
    }
}

/// `data-type="text"`: both operands are compared as strings under the
/// collation.
pub struct TextComparer {
    collation: Arc<dyn Collation>,
}

impl TextComparer {
    pub fn new(collation: Arc<dyn Collation>) -> Self {
        Self { collation }
    }
}

impl AtomicComparer for TextComparer {
    fn compare(
        &self,
        a: Option<&XdmAtomicValue>,
        b: Option<&XdmAtomicValue>,
    ) -> Result<Ordering, ClassificationError> {
        match (a, b) {
            (Some(x), Some(y)) => Ok(self.collation.compare(&x.string_value(), &y.string_value())),
            _ => Ok(compare_empty(a, b).unwrap_or(Ordering::Equal)),
        }
    }
}

/// Reverses another comparer, including where it places empty keys.
pub struct DescendingComparer {
    base: Arc<dyn AtomicComparer>,
}

impl DescendingComparer {
    pub fn new(base: Arc<dyn AtomicComparer>) -> Self {
        Self { base }
    }
}

impl AtomicComparer for DescendingComparer {
    fn compare(
        &self,
        a: Option<&XdmAtomicValue>,
        b: Option<&XdmAtomicValue>,
    ) -> Result<Ordering, ClassificationError> {
        self.base.compare(a, b).map(Ordering::reverse)
    }

    fn equals(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<bool, ClassificationError> {
        self.base.equals(a, b)
    }
}

/// Places empty keys after every present value.
pub struct EmptyGreatestComparer {
    base: Arc<dyn AtomicComparer>,
}

impl EmptyGreatestComparer {
    pub fn new(base: Arc<dyn AtomicComparer>) -> Self {
        Self { base }
    }
}

impl AtomicComparer for EmptyGreatestComparer {
    fn compare(
        &self,
        a: Option<&XdmAtomicValue>,
        b: Option<&XdmAtomicValue>,
    ) -> Result<Ordering, ClassificationError> {
        match (a, b) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Greater),
            (Some(_), None) => Ok(Ordering::Less),
            (Some(_), Some(_)) => self.base.compare(a, b),
        }
    }

    fn equals(&self, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Result<bool, ClassificationError> {
        self.base.equals(a, b)
    }
}

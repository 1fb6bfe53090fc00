use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self { ns_uri, local: local.into() }
    }
}

/// The atomic values a sort key or grouping key can take.
///
/// Only the primitive types that have an ordering (or, for QName, an equality)
/// relevant to `xsl:sort` and `xsl:for-each-group` are modeled; derived types
/// are expected to be mapped onto their primitive by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum XdmAtomicValue {
    Boolean(bool),
    String(String),
    UntypedAtomic(String),
    AnyUri(String),
    Integer(i64),
    Decimal(f64),
    Double(f64),
    Float(f32),
    DateTime(DateTime<FixedOffset>),
    Date {
        date: NaiveDate,
        tz: Option<FixedOffset>,
    },
    Time {
        time: NaiveTime,
        tz: Option<FixedOffset>,
    },
    // Canonical storage: total months / total seconds (both may be negative)
    YearMonthDuration(i32),
    DayTimeDuration(i64),
    QName {
        ns_uri: Option<String>,
        prefix: Option<String>,
        local: String,
    },
}

impl XdmAtomicValue {
    /// Name of the primitive type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            XdmAtomicValue::Boolean(_) => "xs:boolean",
            XdmAtomicValue::String(_) => "xs:string",
            XdmAtomicValue::UntypedAtomic(_) => "xs:untypedAtomic",
            XdmAtomicValue::AnyUri(_) => "xs:anyURI",
            XdmAtomicValue::Integer(_) => "xs:integer",
            XdmAtomicValue::Decimal(_) => "xs:decimal",
            XdmAtomicValue::Double(_) => "xs:double",
            XdmAtomicValue::Float(_) => "xs:float",
            XdmAtomicValue::DateTime(_) => "xs:dateTime",
            XdmAtomicValue::Date { .. } => "xs:date",
            XdmAtomicValue::Time { .. } => "xs:time",
            XdmAtomicValue::YearMonthDuration(_) => "xs:yearMonthDuration",
            XdmAtomicValue::DayTimeDuration(_) => "xs:dayTimeDuration",
            XdmAtomicValue::QName { .. } => "xs:QName",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            XdmAtomicValue::Integer(_)
                | XdmAtomicValue::Decimal(_)
                | XdmAtomicValue::Double(_)
                | XdmAtomicValue::Float(_)
        )
    }

    /// String-like values compare under a collation.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            XdmAtomicValue::String(_) | XdmAtomicValue::UntypedAtomic(_) | XdmAtomicValue::AnyUri(_)
        )
    }

    /// Numeric value as a double, `None` for non-numeric types.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            XdmAtomicValue::Integer(i) => Some(*i as f64),
            XdmAtomicValue::Decimal(d) | XdmAtomicValue::Double(d) => Some(*d),
            XdmAtomicValue::Float(f) => Some(f64::from(*f)),
            _ => None,
        }
    }

    /// `xs:double` conversion as used by `data-type="number"`: numbers convert
    /// directly, booleans map to 0/1, everything else goes through its string
    /// value and becomes NaN when that is not a valid double literal.
    pub fn to_double(&self) -> f64 {
        if let Some(d) = self.as_f64() {
            return d;
        }
        match self {
            XdmAtomicValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => parse_double(&other.string_value()),
        }
    }

    /// Canonical lexical form.
    pub fn string_value(&self) -> String {
        match self {
            XdmAtomicValue::Boolean(b) => b.to_string(),
            XdmAtomicValue::String(s) | XdmAtomicValue::UntypedAtomic(s) | XdmAtomicValue::AnyUri(s) => {
                s.clone()
            }
            XdmAtomicValue::Integer(i) => i.to_string(),
            XdmAtomicValue::Decimal(d) => format!("{d}"),
            XdmAtomicValue::Double(d) => format_double(*d),
            XdmAtomicValue::Float(f) => format_double(f64::from(*f)),
            XdmAtomicValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
            XdmAtomicValue::Date { date, tz } => format!("{}{}", date.format("%Y-%m-%d"), format_tz(*tz)),
            XdmAtomicValue::Time { time, tz } => format!("{}{}", time.format("%H:%M:%S%.f"), format_tz(*tz)),
            XdmAtomicValue::YearMonthDuration(months) => format_year_month(*months),
            XdmAtomicValue::DayTimeDuration(secs) => format_day_time(*secs),
            XdmAtomicValue::QName { prefix, local, .. } => match prefix {
                Some(p) if !p.is_empty() => format!("{p}:{local}"),
                _ => local.clone(),
            },
        }
    }
}

impl fmt::Display for XdmAtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value())
    }
}

impl From<bool> for XdmAtomicValue {
    fn from(b: bool) -> Self {
        XdmAtomicValue::Boolean(b)
    }
}

impl From<i64> for XdmAtomicValue {
    fn from(i: i64) -> Self {
        XdmAtomicValue::Integer(i)
    }
}

impl From<f64> for XdmAtomicValue {
    fn from(d: f64) -> Self {
        XdmAtomicValue::Double(d)
    }
}

impl From<&str> for XdmAtomicValue {
    fn from(s: &str) -> Self {
        XdmAtomicValue::String(s.to_string())
    }
}

impl From<String> for XdmAtomicValue {
    fn from(s: String) -> Self {
        XdmAtomicValue::String(s)
    }
}

fn parse_double(s: &str) -> f64 {
    match s.trim() {
        "INF" | "+INF" => f64::INFINITY,
        "-INF" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that are not xs:double literals
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        t => t.parse::<f64>().unwrap_or(f64::NAN),
    }
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else {
        format!("{d}")
    }
}

fn format_tz(tz: Option<FixedOffset>) -> String {
    match tz {
        None => String::new(),
        Some(off) if off.local_minus_utc() == 0 => "Z".to_string(),
        Some(off) => {
            let secs = off.local_minus_utc();
            let sign = if secs < 0 { '-' } else { '+' };
            let abs = secs.abs();
            format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
        }
    }
}

fn format_year_month(months: i32) -> String {
    let sign = if months < 0 { "-" } else { "" };
    let abs = months.unsigned_abs();
    let (y, m) = (abs / 12, abs % 12);
    match (y, m) {
        (0, m) => format!("{sign}P{m}M"),
        (y, 0) => format!("{sign}P{y}Y"),
        (y, m) => format!("{sign}P{y}Y{m}M"),
    }
}

fn format_day_time(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let abs = secs.unsigned_abs();
    let (d, h, m, s) = (abs / 86_400, (abs % 86_400) / 3600, (abs % 3600) / 60, abs % 60);
    let mut out = format!("{sign}P");
    if d > 0 {
        out.push_str(&format!("{d}D"));
    }
    if h > 0 || m > 0 || s > 0 || d == 0 {
        out.push('T');
        if h > 0 {
            out.push_str(&format!("{h}H"));
        }
        if m > 0 {
            out.push_str(&format!("{m}M"));
        }
        if s > 0 || (h == 0 && m == 0) {
            out.push_str(&format!("{s}S"));
        }
    }
    out
}

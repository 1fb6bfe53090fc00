use crate::compare::ClassificationError;
use crate::consts::ERR_NS;
use crate::xdm::ExpandedName;
use core::fmt;
use std::sync::Arc;

/// Error codes emitted by the sorting and grouping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FOER0000, // generic error
    FOCH0002, // collation does not exist
    XPTY0004, // type error (sort keys not comparable, XPath/XQuery host)
    XTDE0030, // invalid xsl:sort attribute value
    XTDE1030, // sort keys not comparable (XSLT host)
    XTDE1035, // unknown collation on xsl:sort
    XTDE1110, // unknown collation on xsl:for-each-group
    XTTE1100, // group-adjacent key is not a single atomic value
    // Fallback / unknown (kept last)
    Unknown,
}

impl ErrorCode {
    pub fn local_name(&self) -> &'static str {
        match self {
            ErrorCode::FOER0000 => "FOER0000",
            ErrorCode::FOCH0002 => "FOCH0002",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::XTDE0030 => "XTDE0030",
            ErrorCode::XTDE1030 => "XTDE1030",
            ErrorCode::XTDE1035 => "XTDE1035",
            ErrorCode::XTDE1110 => "XTDE1110",
            ErrorCode::XTTE1100 => "XTTE1100",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Returns the QName (ExpandedName) for this error code in the xqt-errors namespace.
    pub fn qname(&self) -> ExpandedName {
        ExpandedName {
            ns_uri: Some(ERR_NS.to_string()),
            local: self.local_name().to_string(),
        }
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        match s.strip_prefix("err:").unwrap_or(s) {
            "FOER0000" => FOER0000,
            "FOCH0002" => FOCH0002,
            "XPTY0004" => XPTY0004,
            "XTDE0030" => XTDE0030,
            "XTDE1030" => XTDE1030,
            "XTDE1035" => XTDE1035,
            "XTDE1110" => XTDE1110,
            "XTTE1100" => XTTE1100,
            _ => Unknown,
        }
    }
}

/// The language whose construct invoked the engine. It only decides which
/// error code a sort comparison failure is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostLanguage {
    #[default]
    XPath,
    XQuery,
    Xslt,
}

impl HostLanguage {
    pub fn sort_comparison_code(self) -> ErrorCode {
        match self {
            HostLanguage::Xslt => ErrorCode::XTDE1030,
            HostLanguage::XPath | HostLanguage::XQuery => ErrorCode::XPTY0004,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub code: ExpandedName,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>, // optional chained cause
}

impl Error {
    pub fn new_qname(code: ExpandedName, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            source: None,
        }
    }

    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new_qname(code.qname(), msg)
    }

    /// Report a comparison classification failure under the code the host
    /// language prescribes, keeping the neutral failure as the source.
    pub fn sort_comparison(err: ClassificationError, host: HostLanguage) -> Self {
        Self::from_code(
            host.sort_comparison_code(),
            format!("non-comparable sort key values: {err}"),
        )
        .with_source(Some(Arc::new(err) as Arc<dyn std::error::Error + Send + Sync>))
    }

    pub fn code_enum(&self) -> ErrorCode {
        // Only ERR_NS codes map to the enum; others are Unknown.
        if self.code.ns_uri.as_deref() == Some(ERR_NS) {
            ErrorCode::from_code(&self.code.local)
        } else {
            ErrorCode::Unknown
        }
    }

    /// Format the code as a human-readable string (err:LOCAL or Q{ns}local).
    pub fn format_code(&self) -> String {
        if self.code.ns_uri.as_deref() == Some(ERR_NS) {
            format!("err:{}", self.code.local)
        } else if let Some(ns) = &self.code.ns_uri {
            format!("Q{{{}}}{}", ns, self.code.local)
        } else {
            self.code.local.clone()
        }
    }

    /// Compose an error with a source cause.
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }

    /// The same failure reported under a different code.
    pub fn recode(mut self, code: ErrorCode) -> Self {
        self.code = code.qname();
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.format_code())
    }
}

/// Unicode codepoint collation (the XPath default).
pub const CODEPOINT_URI: &str = "http://www.w3.org/2005/xpath-functions/collation/codepoint";
pub const SIMPLE_CASE_URI: &str = "urn:platynui:collation:simple-case";
pub const SIMPLE_ACCENT_URI: &str = "urn:platynui:collation:simple-accent";
pub const SIMPLE_CASE_ACCENT_URI: &str = "urn:platynui:collation:simple-case-accent";

/// Namespace URI used for W3C-defined XPath/XSLT error codes (xqt-errors).
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";

/// Initial record capacity when the source cannot report its length.
pub const DEFAULT_SORT_CAPACITY: usize = 100;

/// Absolute slack (in records) above which a materialized array is shrunk.
pub const SHRINK_SLACK_THRESHOLD: usize = 2000;

/// Ranges at or below this length are finished with insertion sort.
pub const INSERTION_SORT_THRESHOLD: usize = 12;

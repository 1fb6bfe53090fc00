use crate::collation::{CaseOrderCollation, Collation, expand_collation_uri};
use crate::compare::{
    AtomicComparer, AtomicSortComparer, DescendingComparer, EmptyGreatestComparer, NumericComparer, TextComparer,
};
use crate::context::{DynamicContext, FocusContext};
use crate::runtime::{Error, ErrorCode};
use crate::xdm::XdmAtomicValue;
use std::sync::Arc;

/// Computes the value of one sort key for the item bound in the focus.
///
/// The engine calls this exactly once per `(item, key index)` pair. `None`
/// stands for an empty key.
pub trait SortKeyEvaluator<T> {
    fn evaluate_sort_key(&self, index: usize, focus: &FocusContext<T>) -> Result<Option<XdmAtomicValue>, Error>;
}

impl<T, F> SortKeyEvaluator<T> for F
where
    F: Fn(usize, &FocusContext<T>) -> Result<Option<XdmAtomicValue>, Error>,
{
    fn evaluate_sort_key(&self, index: usize, focus: &FocusContext<T>) -> Result<Option<XdmAtomicValue>, Error> {
        self(index, focus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "ascending" => Ok(SortOrder::Ascending),
            "descending" => Ok(SortOrder::Descending),
            other => Err(invalid_attribute("order", other, "ascending or descending")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDataType {
    Text,
    Number,
}

impl SortDataType {
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "text" => Ok(SortDataType::Text),
            "number" => Ok(SortDataType::Number),
            other => Err(invalid_attribute("data-type", other, "text or number")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseOrder {
    #[default]
    Default,
    UpperFirst,
    LowerFirst,
}

impl CaseOrder {
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "#default" => Ok(CaseOrder::Default),
            "upper-first" => Ok(CaseOrder::UpperFirst),
            "lower-first" => Ok(CaseOrder::LowerFirst),
            other => Err(invalid_attribute("case-order", other, "upper-first, lower-first or #default")),
        }
    }
}

fn invalid_attribute(name: &str, value: &str, expected: &str) -> Error {
    Error::from_code(
        ErrorCode::XTDE0030,
        format!("{name} must be {expected}, found '{value}'"),
    )
}

// RFC 3066 shape as accepted for xml:lang: alpha primary tag, alphanumeric subtags
fn is_valid_language(lang: &str) -> bool {
    let mut parts = lang.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok && parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// One `xsl:sort` element, or one key of `fn:sort`.
///
/// Attribute values are kept as strings since they may be computed at run
/// time; they are validated when the definition is bound to a context with
/// [`SortKeyDefinition::make_comparator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeyDefinition {
    order: String,
    data_type: Option<String>,
    case_order: String,
    language: Option<String>,
    collation_name: Option<String>,
    stable: String,
    empty_least: bool,
    base_uri: Option<String>,
}

impl Default for SortKeyDefinition {
    fn default() -> Self {
        Self {
            order: "ascending".to_string(),
            data_type: None,
            case_order: "#default".to_string(),
            language: None,
            collation_name: None,
            stable: "yes".to_string(),
            empty_least: true,
            base_uri: None,
        }
    }
}

impl SortKeyDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_case_order(mut self, case_order: impl Into<String>) -> Self {
        self.case_order = case_order.into();
        self
    }

    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.language = Some(lang.into());
        self
    }

    pub fn with_collation(mut self, uri: impl Into<String>) -> Self {
        self.collation_name = Some(uri.into());
        self
    }

    pub fn with_stable(mut self, stable: impl Into<String>) -> Self {
        self.stable = stable.into();
        self
    }

    /// `false` places empty keys after all present values.
    pub fn with_empty_least(mut self, empty_least: bool) -> Self {
        self.empty_least = empty_least;
        self
    }

    /// Static base URI used to resolve a relative collation URI.
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    pub fn case_order(&self) -> &str {
        &self.case_order
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn collation_name(&self) -> Option<&str> {
        self.collation_name.as_deref()
    }

    pub fn empty_least(&self) -> bool {
        self.empty_least
    }

    /// Whether `stable="yes"`. Every sort is stable; the attribute is only
    /// validated.
    pub fn is_stable(&self) -> bool {
        self.stable.trim() == "yes"
    }

    /// Validate the attributes and bind the definition to `ctx`, producing
    /// the comparer used for this key for the lifetime of one sort.
    pub fn make_comparator(&self, ctx: &DynamicContext) -> Result<Arc<dyn AtomicComparer>, Error> {
        let order = SortOrder::parse(&self.order)?;
        let data_type = self.data_type.as_deref().map(SortDataType::parse).transpose()?;
        let case_order = CaseOrder::parse(&self.case_order)?;
        match self.stable.trim() {
            "yes" | "no" => {}
            other => return Err(invalid_attribute("stable", other, "yes or no")),
        }
        if let Some(lang) = &self.language
            && !is_valid_language(lang.trim())
        {
            return Err(Error::from_code(
                ErrorCode::XTDE0030,
                format!("lang must be a valid language code, found '{lang}'"),
            ));
        }

        let mut collation = self.resolve_collation(ctx)?;
        if case_order != CaseOrder::Default {
            collation = Arc::new(CaseOrderCollation::new(collation, case_order == CaseOrder::UpperFirst));
        }

        let mut comparer: Arc<dyn AtomicComparer> = match data_type {
            Some(SortDataType::Number) => Arc::new(NumericComparer),
            Some(SortDataType::Text) => Arc::new(TextComparer::new(collation.clone())),
            None => Arc::new(AtomicSortComparer::new(collation.clone(), ctx.implicit_timezone())),
        };
        if !self.empty_least {
            comparer = Arc::new(EmptyGreatestComparer::new(comparer));
        }
        if order == SortOrder::Descending {
            comparer = Arc::new(DescendingComparer::new(comparer));
        }
        tracing::debug!(
            order = ?order,
            data_type = ?data_type,
            collation = collation.uri(),
            empty_least = self.empty_least,
            "bound sort key"
        );
        Ok(comparer)
    }

    fn resolve_collation(&self, ctx: &DynamicContext) -> Result<Arc<dyn Collation>, Error> {
        let Some(name) = self.collation_name.as_deref() else {
            return Ok(ctx.default_collation());
        };
        let base = self.base_uri.as_deref().or(ctx.base_uri.as_deref());
        expand_collation_uri(name.trim(), base)
            .and_then(|uri| ctx.collation(&uri))
            .map_err(|e| e.recode(ErrorCode::XTDE1035))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("en", true)]
    #[case("en-US", true)]
    #[case("x-klingon", true)]
    #[case("de-1996", true)]
    #[case("", false)]
    #[case("englishlanguage", false)]
    #[case("1en", false)]
    #[case("en-", false)]
    fn language_codes(#[case] lang: &str, #[case] valid: bool) {
        assert_eq!(is_valid_language(lang), valid);
    }

    #[test]
    fn attribute_values_are_trimmed() {
        assert_eq!(SortOrder::parse(" descending ").ok(), Some(SortOrder::Descending));
        assert_eq!(CaseOrder::parse("upper-first").ok(), Some(CaseOrder::UpperFirst));
    }
}

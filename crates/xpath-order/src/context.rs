use crate::collation::{CodepointCollation, Collation, CollationRegistry};
use crate::group::GroupMembers;
use crate::runtime::{Error, ErrorCode, HostLanguage};
use crate::xdm::XdmAtomicValue;
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;

/// Evaluation settings shared by every sort and grouping operation of one
/// query or transformation.
#[derive(Clone)]
pub struct DynamicContext {
    pub default_collation: Option<String>,
    pub collations: Arc<CollationRegistry>,
    pub base_uri: Option<String>,
    pub timezone_override: Option<FixedOffset>,
    pub host_language: HostLanguage,
}

impl Default for DynamicContext {
    fn default() -> Self {
        Self {
            default_collation: None,
            collations: Arc::new(CollationRegistry::default()),
            base_uri: None,
            timezone_override: None,
            host_language: HostLanguage::default(),
        }
    }
}

impl DynamicContext {
    /// Timezone applied to dates and times that carry none.
    pub fn implicit_timezone(&self) -> FixedOffset {
        self.timezone_override.unwrap_or_else(|| Utc.fix())
    }

    /// The default collation, or codepoint when none is configured or the
    /// configured URI is not registered.
    pub fn default_collation(&self) -> Arc<dyn Collation> {
        self.default_collation
            .as_deref()
            .and_then(|uri| self.collations.get(uri))
            .unwrap_or_else(|| Arc::new(CodepointCollation))
    }

    pub fn collation(&self, uri: &str) -> Result<Arc<dyn Collation>, Error> {
        self.collations
            .get(uri)
            .ok_or_else(|| Error::from_code(ErrorCode::FOCH0002, format!("unknown collation URI: {uri}")))
    }
}

pub struct DynamicContextBuilder {
    ctx: DynamicContext,
}

impl Default for DynamicContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicContextBuilder {
    pub fn new() -> Self {
        Self {
            ctx: DynamicContext::default(),
        }
    }

    pub fn with_default_collation(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_collation = Some(uri.into());
        self
    }

    pub fn with_collations(mut self, reg: Arc<CollationRegistry>) -> Self {
        self.ctx.collations = reg;
        self
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.ctx.base_uri = Some(uri.into());
        self
    }

    // Implicit timezone for comparing dates/times without one; offsets of a
    // day or more are ignored
    pub fn with_timezone(mut self, offset_minutes: i32) -> Self {
        if let Some(tz) = offset_minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            self.ctx.timezone_override = Some(tz);
        }
        self
    }

    pub fn with_host_language(mut self, host: HostLanguage) -> Self {
        self.ctx.host_language = host;
        self
    }

    pub fn build(self) -> DynamicContext {
        self.ctx
    }
}

/// The focus a sort key or grouping key is evaluated in: the context item,
/// its 1-based position, the population size when known, and while sorting
/// groups, the group the key belongs to.
#[derive(Clone)]
pub struct FocusContext<T> {
    dyn_ctx: DynamicContext,
    item: Option<T>,
    position: usize,
    size: Option<usize>,
    current_group: Option<GroupMembers<T>>,
    current_grouping_key: Option<XdmAtomicValue>,
}

impl<T: Clone> FocusContext<T> {
    pub fn new(dyn_ctx: DynamicContext) -> Self {
        Self {
            dyn_ctx,
            item: None,
            position: 0,
            size: None,
            current_group: None,
            current_grouping_key: None,
        }
    }

    pub fn dyn_ctx(&self) -> &DynamicContext {
        &self.dyn_ctx
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// A fresh iterator over the group bound while its sort keys are evaluated.
    pub fn current_group(&self) -> Option<GroupMembers<T>> {
        self.current_group.as_ref().map(GroupMembers::restart)
    }

    pub fn current_grouping_key(&self) -> Option<&XdmAtomicValue> {
        self.current_grouping_key.as_ref()
    }

    pub(crate) fn bind_item(&mut self, item: T, position: usize) {
        self.item = Some(item);
        self.position = position;
    }

    pub(crate) fn bind_group(&mut self, members: GroupMembers<T>, key: Option<XdmAtomicValue>) {
        self.current_group = Some(members);
        self.current_grouping_key = key;
    }

    pub(crate) fn set_size(&mut self, size: Option<usize>) {
        self.size = size;
    }
}

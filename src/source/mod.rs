//! Record Source Adapters
//!
//! Read-only, context-scoped views over the two tool collections. Each
//! adapter yields its records in `(sort_value, id)` order and pages by
//! position, so the merged collection can resume either source from a
//! bookmark without offsets.

pub mod external_tool;
pub mod tool_proxy;

pub use external_tool::ExternalToolRecords;
pub use tool_proxy::ToolProxyRecords;

use crate::error::{CollatorError, StorageError};
use crate::store::{ExternalTool, ToolProxy, ToolRecordStore};
use crate::types::{Context, RecordId, SortKey, SortValue, SourcePosition, SourceTag};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Upper bound on rows pulled from the store per round-trip
pub const STORE_BATCH: usize = 100;

/// A record from either backing collection
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    ToolProxy(ToolProxy),
    ExternalTool(ExternalTool),
}

impl SourceRecord {
    pub fn id(&self) -> RecordId {
        match self {
            SourceRecord::ToolProxy(proxy) => proxy.id,
            SourceRecord::ExternalTool(tool) => tool.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SourceRecord::ToolProxy(proxy) => &proxy.name,
            SourceRecord::ExternalTool(tool) => &tool.name,
        }
    }

    pub fn source(&self) -> SourceTag {
        match self {
            SourceRecord::ToolProxy(_) => SourceTag::ToolProxies,
            SourceRecord::ExternalTool(_) => SourceTag::ExternalTools,
        }
    }

    pub fn sort_value(&self, sort_key: SortKey) -> SortValue {
        sort_key.value_for(self.id(), self.name())
    }
}

/// Record Source Adapter interface
pub trait RecordSource: Send + Sync {
    fn tag(&self) -> SourceTag;

    fn sort_key(&self) -> SortKey;

    /// Sort key extractor
    fn sort_value(&self, record: &SourceRecord) -> SortValue {
        record.sort_value(self.sort_key())
    }

    /// Tiebreak extractor
    fn record_id(&self, record: &SourceRecord) -> RecordId {
        record.id()
    }

    /// Whether a fetch costs a full scope read whatever its `limit`
    fn loads_whole_scope(&self) -> bool {
        false
    }

    /// At most `limit` records after `bookmark` (at-or-after when
    /// `include_bookmark`), in `(sort_value, id)` order.
    fn fetch_page(
        &self,
        bookmark: Option<&SourcePosition>,
        limit: usize,
        include_bookmark: bool,
    ) -> Result<Vec<SourceRecord>, CollatorError>;
}

/// A record kind that can back a scoped source
pub trait ScopedRecord: Clone + Send + Sync + 'static {
    const SOURCE: SourceTag;

    fn record_id(&self) -> RecordId;

    fn record_name(&self) -> &str;

    /// Whether the row is live for collation (not deleted)
    fn in_scope(&self) -> bool;

    fn scan(
        store: &dyn ToolRecordStore,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<Self>, StorageError>;

    fn into_source_record(self) -> SourceRecord;
}

/// Adapter over one record kind, scoped to one owning context
pub struct ScopedSource<R> {
    store: Arc<dyn ToolRecordStore>,
    context: Context,
    sort_key: SortKey,
    _record: PhantomData<fn() -> R>,
}

impl<R: ScopedRecord> ScopedSource<R> {
    pub fn new(
        store: Arc<dyn ToolRecordStore>,
        context: Context,
        sort_key: SortKey,
    ) -> Result<Self, CollatorError> {
        context.validate()?;
        Ok(Self {
            store,
            context,
            sort_key,
            _record: PhantomData,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    fn value_of(&self, record: &R) -> SortValue {
        self.sort_key.value_for(record.record_id(), record.record_name())
    }

    /// Range scan from the bookmark id; rows arrive already ordered
    fn fetch_by_id(
        &self,
        position: Option<&SourcePosition>,
        limit: usize,
        include: bool,
    ) -> Result<Vec<R>, CollatorError> {
        let mut from = match position.map(|p| &p.value) {
            Some(SortValue::Id(id)) => *id,
            _ => 0,
        };
        let raw_batch = limit.saturating_add(1).clamp(1, STORE_BATCH);
        let mut records = Vec::with_capacity(raw_batch);

        loop {
            let rows = R::scan(self.store.as_ref(), &self.context, from, raw_batch)?;
            let fetched = rows.len();
            let last_id = rows.last().map(ScopedRecord::record_id);
            trace!(source = %R::SOURCE, from, fetched, "Scanned store rows");

            for row in rows {
                if records.len() >= limit {
                    break;
                }
                if !row.in_scope() {
                    continue;
                }
                let value = self.value_of(&row);
                if position.map_or(true, |p| p.admits(&value, row.record_id(), include)) {
                    records.push(row);
                }
            }

            if records.len() >= limit || fetched < raw_batch {
                break;
            }
            match last_id {
                Some(id) if id < RecordId::MAX => from = id + 1,
                _ => break,
            }
        }
        Ok(records)
    }

    /// Names have no store index: read the whole scope, then sort
    fn fetch_by_name(
        &self,
        position: Option<&SourcePosition>,
        limit: usize,
        include: bool,
    ) -> Result<Vec<R>, CollatorError> {
        let mut keyed: Vec<(SortValue, R)> = Vec::new();
        let mut from = 0;
        loop {
            let rows = R::scan(self.store.as_ref(), &self.context, from, STORE_BATCH)?;
            let fetched = rows.len();
            let last_id = rows.last().map(ScopedRecord::record_id);
            keyed.extend(
                rows.into_iter()
                    .filter(ScopedRecord::in_scope)
                    .map(|row| (self.value_of(&row), row)),
            );
            match last_id {
                Some(id) if fetched == STORE_BATCH && id < RecordId::MAX => from = id + 1,
                _ => break,
            }
        }

        keyed.sort_by(|(va, a), (vb, b)| (va, a.record_id()).cmp(&(vb, b.record_id())));
        Ok(keyed
            .into_iter()
            .filter(|(value, row)| {
                position.map_or(true, |p| p.admits(value, row.record_id(), include))
            })
            .take(limit)
            .map(|(_, row)| row)
            .collect())
    }
}

impl<R: ScopedRecord> RecordSource for ScopedSource<R> {
    fn tag(&self) -> SourceTag {
        R::SOURCE
    }

    fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    fn loads_whole_scope(&self) -> bool {
        self.sort_key == SortKey::Name
    }

    fn fetch_page(
        &self,
        bookmark: Option<&SourcePosition>,
        limit: usize,
        include_bookmark: bool,
    ) -> Result<Vec<SourceRecord>, CollatorError> {
        if let Some(position) = bookmark {
            if !self.sort_key.accepts(&position.value) {
                return Err(CollatorError::InvalidBookmark(format!(
                    "position {:?} does not match sort key '{}'",
                    position.value, self.sort_key
                )));
            }
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let records = match self.sort_key {
            SortKey::Id => self.fetch_by_id(bookmark, limit, include_bookmark)?,
            SortKey::Name => self.fetch_by_name(bookmark, limit, include_bookmark)?,
        };
        Ok(records.into_iter().map(R::into_source_record).collect())
    }
}

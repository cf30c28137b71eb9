//! Tool proxy source: LTI 2.x installations owned by a context.

use crate::error::StorageError;
use crate::source::{ScopedRecord, ScopedSource, SourceRecord};
use crate::store::{ToolProxy, ToolRecordStore};
use crate::types::{Context, RecordId, SourceTag};

pub type ToolProxyRecords = ScopedSource<ToolProxy>;

impl ScopedRecord for ToolProxy {
    const SOURCE: SourceTag = SourceTag::ToolProxies;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn record_name(&self) -> &str {
        &self.name
    }

    fn in_scope(&self) -> bool {
        self.is_installed()
    }

    fn scan(
        store: &dyn ToolRecordStore,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<Self>, StorageError> {
        store.tool_proxies(context, from_id, limit)
    }

    fn into_source_record(self) -> SourceRecord {
        SourceRecord::ToolProxy(self)
    }
}

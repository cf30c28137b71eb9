//! External tool source: LTI 1.1 / 1.3 installations owned by a context.

use crate::error::StorageError;
use crate::source::{ScopedRecord, ScopedSource, SourceRecord};
use crate::store::{ExternalTool, ToolRecordStore};
use crate::types::{Context, RecordId, SourceTag};

pub type ExternalToolRecords = ScopedSource<ExternalTool>;

impl ScopedRecord for ExternalTool {
    const SOURCE: SourceTag = SourceTag::ExternalTools;

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
        store.external_tools(context, from_id, limit)
    }

    fn into_source_record(self) -> SourceRecord {
        SourceRecord::ExternalTool(self)
    }
}

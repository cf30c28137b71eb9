//! Persistence layer for the Tool Record Store

use crate::error::StorageError;
use crate::store::{ExternalTool, ToolProxy, ToolRecordStore};
use crate::types::{Context, ContextType, RecordId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Transactional;
use std::path::Path;

const TOOL_PROXIES_TREE: &str = "tool_proxies";
const TOOL_PROXY_INDEX_TREE: &str = "tool_proxies_by_id";
const EXTERNAL_TOOLS_TREE: &str = "external_tools";
const EXTERNAL_TOOL_INDEX_TREE: &str = "external_tools_by_id";

/// Primary key: context_type(1) || context_id(8, BE) || id(8, BE)
const KEY_LEN: usize = 17;

/// A record kind persisted in its own sled tree
trait StoredRecord: Serialize + DeserializeOwned {
    const KIND: &'static str;
    const TREE: &'static str;
    const INDEX_TREE: &'static str;

    fn record_id(&self) -> RecordId;
    fn owner(&self) -> (ContextType, RecordId);
}

impl StoredRecord for ToolProxy {
    const KIND: &'static str = "tool proxy";
    const TREE: &'static str = TOOL_PROXIES_TREE;
    const INDEX_TREE: &'static str = TOOL_PROXY_INDEX_TREE;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn owner(&self) -> (ContextType, RecordId) {
        (self.context_type, self.context_id)
    }
}

impl StoredRecord for ExternalTool {
    const KIND: &'static str = "external tool";
    const TREE: &'static str = EXTERNAL_TOOLS_TREE;
    const INDEX_TREE: &'static str = EXTERNAL_TOOL_INDEX_TREE;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn owner(&self) -> (ContextType, RecordId) {
        (self.context_type, self.context_id)
    }
}

fn context_prefix(context_type: ContextType, context_id: RecordId) -> [u8; 9] {
    let mut prefix = [0u8; 9];
    prefix[0] = context_type.tag_byte();
    prefix[1..].copy_from_slice(&context_id.to_be_bytes());
    prefix
}

fn primary_key(context_type: ContextType, context_id: RecordId, id: RecordId) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    key[..9].copy_from_slice(&context_prefix(context_type, context_id));
    key[9..].copy_from_slice(&id.to_be_bytes());
    key
}

fn backend_error(action: &str, e: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Failed to {}: {}", action, e),
    ))
}

fn transaction_error(action: &str, e: TransactionError<StorageError>) -> StorageError {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => backend_error(action, e),
    }
}

fn encode<R: StoredRecord>(record: &R) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(record).map_err(|e| {
        StorageError::Corrupt(format!("Failed to serialize {}: {}", R::KIND, e))
    })
}

fn decode<R: StoredRecord>(bytes: &[u8]) -> Result<R, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| {
        StorageError::Corrupt(format!("Failed to deserialize {}: {}", R::KIND, e))
    })
}

/// Sled-based implementation of ToolRecordStore
pub struct SledToolStore {
    db: sled::Db,
}

impl SledToolStore {
    /// Create a new SledToolStore at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| backend_error("open sled database", e))?;
        Ok(Self { db })
    }

    /// In-memory store removed on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| backend_error("open temporary sled database", e))?;
        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree, StorageError> {
        self.db
            .open_tree(name)
            .map_err(|e| backend_error(&format!("open tree {}", name), e))
    }

    fn put<R: StoredRecord>(&self, record: &R) -> Result<(), StorageError> {
        let tree = self.tree(R::TREE)?;
        let index = self.tree(R::INDEX_TREE)?;
        let (context_type, context_id) = record.owner();
        let id = record.record_id();
        let key = primary_key(context_type, context_id, id);
        let value = encode(record)?;

        // Index and primary row change together
        (&tree, &index)
            .transaction(|(tree, index)| -> ConflictableTransactionResult<(), StorageError> {
                // Re-homing a record to another context leaves a stale primary row
                if let Some(previous) = index.insert(&id.to_be_bytes()[..], &key[..])? {
                    if previous.as_ref() != &key[..] {
                        tree.remove(previous)?;
                    }
                }
                tree.insert(&key[..], value.as_slice())?;
                Ok(())
            })
            .map_err(|e| transaction_error(&format!("put {}", R::KIND), e))
    }

    fn get<R: StoredRecord>(&self, id: RecordId) -> Result<Option<R>, StorageError> {
        let index = self.tree(R::INDEX_TREE)?;
        let Some(key) = index
            .get(id.to_be_bytes())
            .map_err(|e| backend_error("read id index", e))?
        else {
            return Ok(None);
        };
        match self
            .tree(R::TREE)?
            .get(key)
            .map_err(|e| backend_error(&format!("get {}", R::KIND), e))?
        {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }

    fn delete<R: StoredRecord>(&self, id: RecordId) -> Result<(), StorageError> {
        let tree = self.tree(R::TREE)?;
        let index = self.tree(R::INDEX_TREE)?;
        (&tree, &index)
            .transaction(|(tree, index)| -> ConflictableTransactionResult<(), StorageError> {
                let Some(key) = index.remove(&id.to_be_bytes()[..])? else {
                    return Err(ConflictableTransactionError::Abort(
                        StorageError::RecordNotFound { kind: R::KIND, id },
                    ));
                };
                tree.remove(key)?;
                Ok(())
            })
            .map_err(|e| transaction_error(&format!("delete {}", R::KIND), e))
    }

    fn scan<R: StoredRecord>(
        &self,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<R>, StorageError> {
        let tree = self.tree(R::TREE)?;
        let prefix = context_prefix(context.context_type, context.id);
        let start = primary_key(context.context_type, context.id, from_id);

        let mut records = Vec::with_capacity(limit.min(64));
        for item in tree.range(start..) {
            if records.len() >= limit {
                break;
            }
            let (key, value) = item.map_err(|e| backend_error("iterate store", e))?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(decode(&value)?);
        }
        Ok(records)
    }

    pub fn put_tool_proxy(&self, proxy: &ToolProxy) -> Result<(), StorageError> {
        self.put(proxy)
    }

    pub fn put_external_tool(&self, tool: &ExternalTool) -> Result<(), StorageError> {
        self.put(tool)
    }

    pub fn get_tool_proxy(&self, id: RecordId) -> Result<Option<ToolProxy>, StorageError> {
        self.get(id)
    }

    pub fn get_external_tool(&self, id: RecordId) -> Result<Option<ExternalTool>, StorageError> {
        self.get(id)
    }

    pub fn delete_tool_proxy(&self, id: RecordId) -> Result<(), StorageError> {
        self.delete::<ToolProxy>(id)
    }

    pub fn delete_external_tool(&self, id: RecordId) -> Result<(), StorageError> {
        self.delete::<ExternalTool>(id)
    }

    /// Batch insert records of both kinds
    ///
    /// Records must not already exist under another context; use the
    /// single-record puts to move a record between contexts.
    pub fn import(
        &self,
        tool_proxies: &[ToolProxy],
        external_tools: &[ExternalTool],
    ) -> Result<(), StorageError> {
        self.apply_batch(tool_proxies)?;
        self.apply_batch(external_tools)?;
        Ok(())
    }

    fn apply_batch<R: StoredRecord>(&self, records: &[R]) -> Result<(), StorageError> {
        let mut batch = sled::Batch::default();
        let mut index_batch = sled::Batch::default();

        for record in records {
            let (context_type, context_id) = record.owner();
            let key = primary_key(context_type, context_id, record.record_id());
            batch.insert(&key[..], encode(record)?);
            index_batch.insert(&record.record_id().to_be_bytes()[..], &key[..]);
        }

        let tree = self.tree(R::TREE)?;
        let index = self.tree(R::INDEX_TREE)?;
        (&tree, &index)
            .transaction(|(tree, index)| -> ConflictableTransactionResult<(), StorageError> {
                tree.apply_batch(&batch)?;
                index.apply_batch(&index_batch)?;
                Ok(())
            })
            .map_err(|e| transaction_error(&format!("import {} batch", R::KIND), e))
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| backend_error("flush database", e))?;
        Ok(())
    }
}

impl ToolRecordStore for SledToolStore {
    fn tool_proxies(
        &self,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<ToolProxy>, StorageError> {
        self.scan(context, from_id, limit)
    }

    fn external_tools(
        &self,
        context: &Context,
        from_id: RecordId,
        limit: usize,
    ) -> Result<Vec<ExternalTool>, StorageError> {
        self.scan(context, from_id, limit)
    }
}

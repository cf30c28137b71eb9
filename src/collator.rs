//! App Collator
//!
//! Entry point for one owning context: builds the merged tool proxy and
//! external tool collection, and projects records into app definitions.
//! Adapters are rebuilt on every call; nothing is cached between requests.

use crate::bookmark::BookmarkCodec;
use crate::collection::MergedCollection;
use crate::config::{CollectionConfig, LtiAppsConfig};
use crate::definition::{AppDefinition, DefinitionProjector, ReregistrationUrlBuilder};
use crate::error::CollatorError;
use crate::features::FeatureFlags;
use crate::source::{ExternalToolRecords, RecordSource, SourceRecord, ToolProxyRecords};
use crate::store::ToolRecordStore;
use crate::types::{Context, SortKey};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Pagination and bookmark settings shared by every collection a collator builds
#[derive(Debug, Clone)]
pub struct CollatorSettings {
    pub collection: CollectionConfig,
    pub codec: BookmarkCodec,
}

impl CollatorSettings {
    pub fn new(collection: CollectionConfig, codec: BookmarkCodec) -> Self {
        Self { collection, codec }
    }

    pub fn from_config(config: &LtiAppsConfig) -> Self {
        Self {
            collection: config.collection.clone(),
            codec: BookmarkCodec::from_secret(&config.bookmarks.secret),
        }
    }
}

pub struct AppCollator {
    context: Context,
    store: Arc<dyn ToolRecordStore>,
    projector: DefinitionProjector,
    settings: CollatorSettings,
}

impl AppCollator {
    pub fn new(
        context: Context,
        store: Arc<dyn ToolRecordStore>,
        features: Arc<dyn FeatureFlags>,
        url_builder: Arc<dyn ReregistrationUrlBuilder>,
        settings: CollatorSettings,
    ) -> Result<Self, CollatorError> {
        context.validate()?;
        Ok(Self {
            context,
            store,
            projector: DefinitionProjector::new(features, url_builder),
            settings,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Merged collection in the configured default sort
    pub fn bookmarked_collection(&self) -> Result<MergedCollection, CollatorError> {
        self.bookmarked_collection_sorted_by(self.settings.collection.default_sort)
    }

    #[instrument(skip(self), fields(context = %self.context))]
    pub fn bookmarked_collection_sorted_by(
        &self,
        sort_key: SortKey,
    ) -> Result<MergedCollection, CollatorError> {
        let sources: Vec<Box<dyn RecordSource>> = vec![
            Box::new(ToolProxyRecords::new(
                Arc::clone(&self.store),
                self.context,
                sort_key,
            )?),
            Box::new(ExternalToolRecords::new(
                Arc::clone(&self.store),
                self.context,
                sort_key,
            )?),
        ];
        debug!(sources = sources.len(), "Built merged collection");
        MergedCollection::new(
            self.context,
            sort_key,
            sources,
            self.settings.codec.clone(),
            &self.settings.collection,
        )
    }

    /// Project records in input order; the first failure aborts the batch
    #[instrument(skip(self, records), fields(context = %self.context, count = records.len()))]
    pub fn app_definitions(
        &self,
        records: &[SourceRecord],
    ) -> Result<Vec<AppDefinition>, CollatorError> {
        records
            .iter()
            .map(|record| self.projector.project(&self.context, record))
            .collect()
    }
}

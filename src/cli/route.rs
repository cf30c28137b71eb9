//! CLI route: single route table and run context. Dispatches to the collator and presentation.

use crate::collator::{AppCollator, CollatorSettings};
use crate::config::{ConfigLoader, LtiAppsConfig};
use crate::definition::TemplateUrlBuilder;
use crate::error::{CollatorError, StorageError};
use crate::features::StaticFeatureFlags;
use crate::store::{ExternalTool, SledToolStore, ToolProxy};
use crate::types::{Context, ContextType, RecordId, SortKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, info_span, warn};

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_app_list_json, format_app_list_text, format_import_summary, ImportSummary,
};

/// Shape of an `import` input file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportFile {
    #[serde(default)]
    pub tool_proxies: Vec<ToolProxy>,
    #[serde(default)]
    pub external_tools: Vec<ExternalTool>,
}

/// Runtime context for CLI execution: workspace, loaded config, and the open store.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: LtiAppsConfig,
    store: Arc<SledToolStore>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CollatorError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.ensure_valid()?;
        if config.bookmarks.uses_default_secret() {
            warn!("Bookmarks are signed with the built-in development secret");
        }

        let store_path = resolve_store_path(&workspace_root, &config.storage.store_path);
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let store = Arc::new(SledToolStore::new(&store_path)?);

        Ok(Self {
            workspace_root,
            config,
            store,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &LtiAppsConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<SledToolStore> {
        Arc::clone(&self.store)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, CollatorError> {
        let _span = info_span!("command", name = command_name(command)).entered();
        match command {
            Commands::Import { file } => self.handle_import(file),
            Commands::List {
                context_type,
                context_id,
                root_account_id,
                per_page,
                page,
                sort,
                format,
            } => {
                let context = parse_context(context_type, *context_id, *root_account_id)?;
                let sort_key = match sort {
                    Some(sort) => sort.parse::<SortKey>()?,
                    None => self.config.collection.default_sort,
                };
                self.handle_list(context, sort_key, *per_page, page.as_deref(), format)
            }
        }
    }

    fn handle_import(&self, file: &Path) -> Result<String, CollatorError> {
        let contents = std::fs::read_to_string(file).map_err(StorageError::IoError)?;
        let import: ImportFile = serde_json::from_str(&contents).map_err(|e| {
            CollatorError::InvalidArgument(format!("{}: {}", file.display(), e))
        })?;

        self.store
            .import(&import.tool_proxies, &import.external_tools)?;
        self.store.flush()?;
        info!(
            tool_proxies = import.tool_proxies.len(),
            external_tools = import.external_tools.len(),
            "Imported records"
        );

        Ok(format_import_summary(&ImportSummary {
            file: file.to_path_buf(),
            tool_proxies: import.tool_proxies.len(),
            external_tools: import.external_tools.len(),
        }))
    }

    fn handle_list(
        &self,
        context: Context,
        sort_key: SortKey,
        per_page: usize,
        page: Option<&str>,
        format: &str,
    ) -> Result<String, CollatorError> {
        let collator = AppCollator::new(
            context,
            self.store(),
            Arc::new(StaticFeatureFlags::from_config(&self.config.features)),
            Arc::new(TemplateUrlBuilder::new(
                self.config.reregistration.url_template.clone(),
            )?),
            CollatorSettings::from_config(&self.config),
        )?;

        let page = collator
            .bookmarked_collection_sorted_by(sort_key)?
            .paginate(page, per_page)?;
        let definitions = collator.app_definitions(page.records())?;

        match format {
            "json" => format_app_list_json(&definitions, page.next_page()),
            "text" => Ok(format_app_list_text(&definitions, page.next_page())),
            other => Err(CollatorError::InvalidArgument(format!(
                "Unknown format '{}' (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// Accounts default to being their own root; courses must name one.
fn parse_context(
    context_type: &str,
    context_id: RecordId,
    root_account_id: Option<RecordId>,
) -> Result<Context, CollatorError> {
    let context_type = context_type.parse::<ContextType>()?;
    let root_account_id = match (context_type, root_account_id) {
        (_, Some(root)) => root,
        (ContextType::Account, None) => context_id,
        (ContextType::Course, None) => {
            return Err(CollatorError::InvalidArgument(
                "--root-account-id is required for courses".to_string(),
            ))
        }
    };
    let context = Context {
        context_type,
        id: context_id,
        root_account_id,
    };
    context.validate()?;
    Ok(context)
}

fn resolve_store_path(workspace_root: &Path, store_path: &Path) -> PathBuf {
    if store_path.is_absolute() {
        store_path.to_path_buf()
    } else {
        workspace_root.join(store_path)
    }
}

//! Designer - the main entry point for Taskflow.
//!
//! The designer wires together the pieces an editor shell needs:
//! - The storage backend holding templates, task types and conditions
//! - The shared metadata catalog
//! - The rule engine and the tree layout
//! - Importers and the spreadsheet export

use std::{path::Path, sync::Arc};

use tokio::runtime::Runtime;
use tracing::info;

use crate::{
    Config, Result, TaskflowError,
    catalog::{CatalogSnapshot, MetaCatalog},
    check::{CheckReport, Checker},
    condition,
    editor::FlowEditor,
    export, import,
    import::ImportSummary,
    layout::TreeLayout,
    model::TaskFlowModel,
    store::{
        Store,
        data::TaskFlow,
        query::{Expr, Query},
    },
};

/// Composition root of a designer session.
///
/// # Example
///
/// ```rust,ignore
/// let designer = DesignerBuilder::new().build()?;
/// designer.import_task_types(&types_json)?;
///
/// let mut editor = designer.editor();
/// editor.add_task(None, designer.catalog().snapshot().task_meta("Group"))?;
/// let report = designer.check(&editor.to_template("Daily", "")?);
/// ```
pub struct Designer {
    config: Config,
    store: Arc<Store>,
    catalog: Arc<MetaCatalog>,
    checker: Checker,
    layout: TreeLayout,
    /// Runtime driving the postgres client, kept alive with the designer.
    #[allow(dead_code)]
    runtime: Option<Arc<Runtime>>,
}

impl Designer {
    pub(crate) fn new(
        config: Config,
        store: Arc<Store>,
        runtime: Option<Arc<Runtime>>,
    ) -> Self {
        Self {
            checker: Checker::new(config.check.clone().into()),
            layout: TreeLayout::from(config.layout.clone()),
            catalog: Arc::new(MetaCatalog::new()),
            config,
            store,
            runtime,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn catalog(&self) -> Arc<MetaCatalog> {
        self.catalog.clone()
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    /// Reloads task types and conditions into the catalog.
    pub fn refresh_catalog(&self) -> Result<Arc<CatalogSnapshot>> {
        self.catalog.refresh(&self.store)
    }

    /// Empty editing session using the configured layout.
    pub fn editor(&self) -> FlowEditor {
        FlowEditor::new(self.layout)
    }

    /// Editing session over a saved template.
    pub fn open_flow(
        &self,
        id: &str,
    ) -> Result<FlowEditor> {
        Ok(self.edit_flow(&self.store.load_flow(id)?))
    }

    /// Editing session over a flow that is not saved yet.
    pub fn edit_flow(
        &self,
        flow: &TaskFlowModel,
    ) -> FlowEditor {
        FlowEditor::open(flow, self.layout)
    }

    pub fn check(
        &self,
        flow: &TaskFlowModel,
    ) -> CheckReport {
        self.checker.check_all(&flow.nodes)
    }

    /// Copy of `flow` with every visible node re-positioned.
    pub fn layout(
        &self,
        flow: &TaskFlowModel,
    ) -> TaskFlowModel {
        TaskFlowModel {
            nodes: self.layout.layout(&flow.nodes),
            ..flow.clone()
        }
    }

    pub fn save_template(
        &self,
        flow: &TaskFlowModel,
    ) -> Result<bool> {
        self.store.save_flow(flow)
    }

    pub fn load_template(
        &self,
        id: &str,
    ) -> Result<TaskFlowModel> {
        self.store.load_flow(id)
    }

    /// Saved templates, newest first, optionally filtered by a keyword
    /// found in the title or the description.
    pub fn list_templates(
        &self,
        keyword: Option<&str>,
    ) -> Result<Vec<TaskFlow>> {
        let mut q = Query::new().set_order("create_time", true);
        if let Some(keyword) = keyword.filter(|k| !k.trim().is_empty()) {
            q = q.filter(Expr::search(&["title", "description"], keyword.trim()));
        }
        Ok(self.store.list_flows(&q)?.rows)
    }

    pub fn delete_template(
        &self,
        id: &str,
    ) -> Result<bool> {
        self.store.delete_flow(id)
    }

    /// Imports task types and refreshes the catalog.
    pub fn import_task_types(
        &self,
        text: &str,
    ) -> Result<ImportSummary> {
        let summary = import::import_task_types(&self.store, text)?;
        self.refresh_catalog()?;
        Ok(summary)
    }

    /// Imports conditions and refreshes the catalog.
    pub fn import_conditions(
        &self,
        text: &str,
    ) -> Result<ImportSummary> {
        let summary = import::import_conditions(&self.store, text)?;
        self.refresh_catalog()?;
        Ok(summary)
    }

    /// Builds a template from the rows of `activity_id` in an exported
    /// file and saves it.
    pub fn import_template(
        &self,
        text: &str,
        activity_id: &str,
        title: &str,
        description: &str,
    ) -> Result<TaskFlowModel> {
        let bundles = import::parse_flow_bundles(text)?;
        let bundle = bundles.iter().find(|b| b.activity_id == activity_id).ok_or_else(|| TaskflowError::NotFound(format!("activity '{}'", activity_id)))?;

        let flow = bundle.into_template(title, description, &self.catalog.snapshot())?;
        self.store.save_flow(&flow)?;
        info!("template {} imported from activity {} ({} nodes)", flow.id, activity_id, flow.nodes.len());
        self.store.load_flow(&flow.id)
    }

    /// Readable rendering of a stored condition tree.
    pub fn describe_condition(
        &self,
        id: &str,
    ) -> String {
        condition::describe_condition(|id| self.store.find_condition(id).ok(), id)
    }

    pub fn export_xlsx(
        &self,
        flow: &TaskFlowModel,
        activity_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        export::write_xlsx(&flow.nodes, activity_id, path)
    }
}

//! # Taskflow
//!
//! Taskflow is the authoring core of a game-activity task designer.
//! Designers build trees of task nodes; Taskflow validates them, lays them
//! out and persists them as reusable templates.
//!
//! ## Core Features
//!
//! - **Rule Engine**: Sixteen structural and metadata rules reporting per-node findings
//! - **Tree Layout**: Pyramid auto-layout that tolerates cycles and collapsed subtrees
//! - **Editor Session**: Headless add / delete / connect / import operations over a flow
//! - **Pluggable Storage**: Supports in-memory storage (testing) and PostgreSQL (production)
//! - **Import & Export**: JSON metadata and template importers, XLSX export of node lists
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskflow::{DesignerBuilder, TaskFlowModel};
//!
//! let designer = DesignerBuilder::new().build()?;
//!
//! let flow = TaskFlowModel::from_json(json_str)?;
//! let report = designer.check(&flow);
//! let flow = designer.layout(&flow);
//! designer.save_template(&flow)?;
//! ```

mod builder;
pub mod catalog;
pub mod check;
pub mod condition;
mod config;
mod designer;
pub mod editor;
mod error;
pub mod export;
pub mod idgen;
pub mod import;
pub mod layout;
mod model;
pub mod store;
pub mod utils;

use std::sync::{Arc, RwLock};

pub use builder::DesignerBuilder;
pub use catalog::{CatalogHandle, CatalogSnapshot, MetaCatalog};
pub use check::{CheckItem, CheckLevel, CheckOptions, CheckReport, CheckRule, Checker, NodeCheckResult};
pub use condition::{ConditionOperator, describe_condition};
pub use config::*;
pub use designer::Designer;
pub use editor::FlowEditor;
pub use error::TaskflowError;
pub use idgen::TaskIdGenerator;
pub use import::{FlowBundle, ImportSummary};
pub use layout::TreeLayout;
pub use model::*;

/// Result type alias for Taskflow operations.
pub type Result<T> = std::result::Result<T, TaskflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;

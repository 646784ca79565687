//! `taskflow` command line.
//!
//! Checks, lays out and exports flow files, imports metadata and manages
//! saved templates. With the default in-memory store nothing outlives the
//! process; configure `store_type = "postgres"` to keep templates.

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use taskflow::{CheckLevel, Config, Designer, DesignerBuilder, TaskFlowModel, utils::time::format_millis};

#[derive(Parser)]
#[command(name = "taskflow", about = "Task flow designer tools", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a flow file
    Check {
        flow: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Auto-layout a flow file
    Layout {
        flow: PathBuf,
        /// Output file, stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Export the nodes of a flow file to xlsx
    Export {
        flow: PathBuf,
        #[arg(long)]
        activity_id: String,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Import task type metadata
    ImportTypes { file: PathBuf },
    /// Import conditions
    ImportConditions { file: PathBuf },
    /// Import one activity of an exported node table as a template
    ImportTemplates {
        file: PathBuf,
        #[arg(long)]
        activity: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Manage saved templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommand,
    },
    /// Render a stored condition tree
    Condition { id: String },
}

#[derive(Subcommand)]
enum TemplateCommand {
    List {
        /// Keyword matched against title and description
        #[arg(long)]
        keyword: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
    Save {
        flow: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn read_flow(path: &PathBuf) -> anyhow::Result<TaskFlowModel> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(TaskFlowModel::from_json(&text)?)
}

fn read_text(path: &PathBuf) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn check(
    designer: &Designer,
    flow: &TaskFlowModel,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let report = designer.check(flow);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in report.entries() {
            for item in &entry.result.list {
                println!("{} [{}] {}: {}", entry.node_id, item.level, item.title, item.message);
            }
        }
        println!("{} errors, {} warnings", report.errors(), report.warnings());
    }
    Ok(if report.level() == CheckLevel::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn templates(
    designer: &Designer,
    command: TemplateCommand,
) -> anyhow::Result<()> {
    match command {
        TemplateCommand::List {
            keyword,
        } => {
            for flow in designer.list_templates(keyword.as_deref())? {
                println!("{}\t{}\t{} nodes\t{}", flow.id, flow.title, flow.nodes.len(), format_millis(flow.update_time.max(flow.create_time)));
            }
        }
        TemplateCommand::Show {
            id,
        } => println!("{}", designer.load_template(&id)?.to_json()?),
        TemplateCommand::Delete {
            id,
        } => {
            if !designer.delete_template(&id)? {
                bail!("template {} not found", id);
            }
        }
        TemplateCommand::Save {
            flow,
            title,
            description,
        } => {
            let editor = designer.edit_flow(&read_flow(&flow)?);
            let template = editor.to_template(&title, &description)?;
            designer.save_template(&template)?;
            println!("{}", template.id);
        }
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::create(path)?,
        None => Config::default(),
    };
    init_logging(&config);
    debug!("config: {:?}", config);

    let designer = DesignerBuilder::new().config(config).build()?;
    match cli.command {
        Command::Check {
            flow,
            json,
        } => return check(&designer, &read_flow(&flow)?, json),
        Command::Layout {
            flow,
            output,
        } => {
            let flow = designer.layout(&read_flow(&flow)?);
            match output {
                Some(path) => fs::write(&path, flow.to_json()?).with_context(|| format!("cannot write {}", path.display()))?,
                None => println!("{}", flow.to_json()?),
            }
        }
        Command::Export {
            flow,
            activity_id,
            output,
        } => designer.export_xlsx(&read_flow(&flow)?, &activity_id, &output)?,
        Command::ImportTypes {
            file,
        } => println!("task types: {}", designer.import_task_types(&read_text(&file)?)?),
        Command::ImportConditions {
            file,
        } => println!("conditions: {}", designer.import_conditions(&read_text(&file)?)?),
        Command::ImportTemplates {
            file,
            activity,
            title,
            description,
        } => {
            let flow = designer.import_template(&read_text(&file)?, &activity, &title, &description)?;
            println!("{}\t{} nodes", flow.id, flow.nodes.len());
        }
        Command::Templates {
            command,
        } => templates(&designer, command)?,
        Command::Condition {
            id,
        } => println!("{}", designer.describe_condition(&id)),
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    run(Cli::parse())
}

//! Flat spreadsheet export of a flow's nodes.

use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::{Result, TaskflowError, model::TaskNodeModel};

pub const SHEET_NAME: &str = "任务节点";

pub const FIELD_KEYS: [&str; 21] = [
    "id",
    "activityId",
    "parentTaskId",
    "promiseTaskId",
    "taskId",
    "nodeType",
    "taskType",
    "targetProcess",
    "weight",
    "condition",
    "rewardType",
    "reward",
    "desc",
    "sortId",
    "timeType",
    "startTime",
    "endTime",
    "startTimeStr",
    "endTimeStr",
    "offsetTime",
    "extraInfo",
];

pub const FIELD_TYPES: [&str; 21] = [
    "int", "string", "string", "string", "string", "string", "string", "int", "int", "string", "string", "string", "string", "int", "int", "long", "long", "string", "string", "long", "string",
];

pub const FIELD_LABELS: [&str; 21] = [
    "下标",
    "活动id",
    "父任务id",
    "前置任务id",
    "任务id",
    "节点类型",
    "任务条件类型",
    "达成值",
    "任务权重",
    "条件",
    "奖励类型",
    "任务奖励",
    "任务描述",
    "任务排序",
    "时间开启类型",
    "开始时间",
    "结束时间",
    "开启时间",
    "结算时间",
    "偏移时间/秒",
    "额外信息",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
}

impl ExportCell {
    fn number(value: Option<i64>) -> Self {
        match value {
            Some(n) => ExportCell::Number(n as f64),
            None => ExportCell::Text(String::new()),
        }
    }

    /// Numeric text goes out as a number, anything else as text.
    fn long(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(n) => ExportCell::Number(n as f64),
            Err(_) => ExportCell::Text(value.to_string()),
        }
    }

    fn text(value: &str) -> Self {
        ExportCell::Text(value.to_string())
    }

    fn write(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
    ) -> Result<()> {
        match self {
            ExportCell::Text(s) => sheet.write_string(row, col, s)?,
            ExportCell::Number(n) => sheet.write_number(row, col, *n)?,
        };
        Ok(())
    }
}

/// Data rows in [`FIELD_KEYS`] order, one per node.
pub fn export_rows(
    nodes: &[TaskNodeModel],
    activity_id: &str,
) -> Result<Vec<Vec<ExportCell>>> {
    if nodes.is_empty() {
        return Err(TaskflowError::Export("no nodes to export".into()));
    }
    if activity_id.trim().is_empty() {
        return Err(TaskflowError::Export("activity id is required".into()));
    }

    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let d = &node.data;
            let extra_info = serde_json::to_string(&d.extra_info)?;
            Ok(vec![
                ExportCell::Number((i + 1) as f64),
                ExportCell::text(activity_id),
                ExportCell::text(&d.parent_task_id),
                ExportCell::text(&d.promise_task_id),
                ExportCell::text(&d.task_id),
                ExportCell::text(&d.node_type),
                ExportCell::text(&d.task_type),
                ExportCell::number(d.target_process),
                ExportCell::number(d.weight),
                ExportCell::text(&d.condition),
                ExportCell::text(&d.reward_type),
                ExportCell::text(&d.reward),
                ExportCell::text(&d.desc),
                ExportCell::number(d.sort_id),
                ExportCell::number(d.time_type),
                ExportCell::long(&d.start_time),
                ExportCell::long(&d.end_time),
                ExportCell::text(&d.start_time_str),
                ExportCell::text(&d.end_time_str),
                ExportCell::number(d.offset_time),
                ExportCell::Text(extra_info),
            ])
        })
        .collect()
}

fn build_workbook(
    nodes: &[TaskNodeModel],
    activity_id: &str,
) -> Result<Workbook> {
    let rows = export_rows(nodes, activity_id)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (row, header) in [FIELD_KEYS, FIELD_TYPES, FIELD_LABELS].iter().enumerate() {
        for (col, text) in header.iter().enumerate() {
            sheet.write_string(row as u32, col as u16, *text)?;
        }
    }
    for (i, cells) in rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            cell.write(sheet, (i + 3) as u32, col as u16)?;
        }
    }
    Ok(workbook)
}

pub fn write_xlsx(
    nodes: &[TaskNodeModel],
    activity_id: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    let mut workbook = build_workbook(nodes, activity_id)?;
    workbook.save(path.as_ref())?;
    info!("exported {} nodes to {}", nodes.len(), path.as_ref().display());
    Ok(())
}

pub fn to_xlsx_buffer(
    nodes: &[TaskNodeModel],
    activity_id: &str,
) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(nodes, activity_id)?;
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn nodes() -> Vec<TaskNodeModel> {
        let mut root = TaskNodeModel::new("Group_1", "Group");
        root.data.weight = Some(3);
        root.data.start_time = "1717200000".into();
        root.data.end_time = "2025-06-15".into();
        root.data.extra_info.insert("k".into(), json!(1));
        let child = TaskNodeModel::new("Task_1", "Task").with_parent("Group_1");
        vec![root, child]
    }

    #[test]
    fn test_headers_line_up() {
        assert_eq!(FIELD_KEYS.len(), FIELD_TYPES.len());
        assert_eq!(FIELD_KEYS.len(), FIELD_LABELS.len());
        assert_eq!(FIELD_LABELS[19], "偏移时间/秒");
    }

    #[test]
    fn test_export_rows() {
        let rows = export_rows(&nodes(), "80001").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 21);

        assert_eq!(rows[0][0], ExportCell::Number(1.0));
        assert_eq!(rows[1][0], ExportCell::Number(2.0));
        assert_eq!(rows[1][1], ExportCell::Text("80001".into()));
        assert_eq!(rows[1][2], ExportCell::Text("Group_1".into()));
        assert_eq!(rows[0][8], ExportCell::Number(3.0));
        assert_eq!(rows[0][7], ExportCell::Text(String::new()));
        assert_eq!(rows[0][15], ExportCell::Number(1717200000.0));
        assert_eq!(rows[0][16], ExportCell::Text("2025-06-15".into()));
        assert_eq!(rows[0][20], ExportCell::Text("{\"k\":1}".into()));
        assert_eq!(rows[1][20], ExportCell::Text("{}".into()));
    }

    #[test]
    fn test_export_requires_nodes_and_activity() {
        assert!(matches!(export_rows(&[], "1"), Err(TaskflowError::Export(_))));
        assert!(matches!(export_rows(&nodes(), " "), Err(TaskflowError::Export(_))));
    }

    #[test]
    fn test_write_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.xlsx");
        write_xlsx(&nodes(), "80001", &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(to_xlsx_buffer(&nodes(), "80001").unwrap().starts_with(b"PK"));
    }
}

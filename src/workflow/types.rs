/// Wire types exchanged with the workflow editor
///
/// JSON shapes use PascalCase field names. Save requests carry a
/// `WorkflowInfo` envelope plus the ordered task list; read paths return
/// summaries, task lists and projected graph nodes in the same casing.

use crate::workflow::period::Period;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// How a workflow is launched by the engine
///
/// Serialized as its integer code (`0` periodic, `1` cron, `2` manual) on the
/// wire and as its lowercase name inside workflow documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum LaunchType {
    Periodic,
    Cron,
    Manual,
}

impl LaunchType {
    /// Lowercase name used in the `launchType` setting
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchType::Periodic => "periodic",
            LaunchType::Cron => "cron",
            LaunchType::Manual => "manual",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [LaunchType::Periodic, LaunchType::Cron, LaunchType::Manual]
            .into_iter()
            .find(|launch_type| launch_type.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for LaunchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for LaunchType {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LaunchType::Periodic),
            1 => Ok(LaunchType::Cron),
            2 => Ok(LaunchType::Manual),
            other => Err(format!("unknown launch type {}", other)),
        }
    }
}

impl From<LaunchType> for i64 {
    fn from(launch_type: LaunchType) -> Self {
        match launch_type {
            LaunchType::Periodic => 0,
            LaunchType::Cron => 1,
            LaunchType::Manual => 2,
        }
    }
}

/// Workflow metadata of a save request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowInfo {
    pub id: i32,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    pub launch_type: LaunchType,
    /// Duration text, empty or missing for zero
    #[serde(default)]
    pub period: Option<String>,
    /// Required to be valid when `launch_type` is cron
    #[serde(default)]
    pub cron_expression: Option<String>,
    pub is_enabled: bool,
    /// Selects the creation path (`true`) or the update path (`false`)
    pub is_new: bool,
    /// Target file, only used by the creation path
    #[serde(default)]
    pub path: Option<String>,
}

impl WorkflowInfo {
    pub fn period(&self) -> Result<Period, crate::workflow::period::PeriodError> {
        Period::parse_or_zero(self.period.as_deref())
    }

    pub fn cron_expression(&self) -> &str {
        self.cron_expression.as_deref().unwrap_or_default()
    }
}

/// A task as edited by the client and as listed from a loaded workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskInfo {
    pub id: i32,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub settings: Vec<SettingInfo>,
}

/// A named task setting with its extra attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingInfo {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeInfo {
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub value: String,
}

/// Body of a save request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaveRequest {
    /// Id of the workflow to update, as text or number; falls back to
    /// `WorkflowInfo.Id` when absent
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<i32>,
    pub workflow_info: WorkflowInfo,
    #[serde(default)]
    pub tasks: Vec<TaskInfo>,
}

impl SaveRequest {
    /// Id used to resolve the workflow on the update path
    pub fn target_id(&self) -> i32 {
        self.id.unwrap_or(self.workflow_info.id)
    }
}

/// Listing entry describing a loaded workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowSummary {
    pub id: i32,
    pub name: String,
    pub launch_type: LaunchType,
    pub is_enabled: bool,
    pub description: String,
    pub is_running: bool,
    pub is_paused: bool,
    /// Zero-padded `dd.hh:mm:ss`
    pub period: String,
    pub cron_expression: String,
    pub path: String,
    pub is_execution_graph_empty: bool,
}

/// Display node produced by the execution graph projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphNodeInfo {
    pub id: String,
    pub name: String,
    pub parent_id: String,
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i32),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid workflow id '{}'", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn launch_type_codes() {
        let parsed: LaunchType = serde_json::from_value(json!(1)).unwrap();
        assert_eq!(parsed, LaunchType::Cron);
        assert_eq!(serde_json::to_value(LaunchType::Manual).unwrap(), json!(2));
        assert!(serde_json::from_value::<LaunchType>(json!(7)).is_err());
        assert_eq!(LaunchType::from_name("Periodic"), Some(LaunchType::Periodic));
    }

    #[test]
    fn save_request_accepts_textual_id_and_nulls() {
        let request: SaveRequest = serde_json::from_value(json!({
            "Id": "12",
            "WorkflowInfo": {
                "Id": 3, "Name": "wf", "Description": null, "LaunchType": 0,
                "Period": null, "CronExpression": null, "IsEnabled": true, "IsNew": false
            },
            "Tasks": [{
                "Id": 1, "Name": "t", "Description": "d", "IsEnabled": false,
                "Settings": [{ "Name": "s", "Value": null, "Attributes": [] }]
            }]
        }))
        .unwrap();

        assert_eq!(request.target_id(), 12);
        assert_eq!(request.workflow_info.description, "");
        assert_eq!(request.workflow_info.cron_expression(), "");
        assert_eq!(request.tasks[0].settings[0].value, None);
    }

    #[test]
    fn target_id_falls_back_to_workflow_info() {
        let request: SaveRequest = serde_json::from_value(json!({
            "WorkflowInfo": {
                "Id": 9, "Name": "wf", "LaunchType": 2, "IsEnabled": true, "IsNew": false
            },
            "Tasks": []
        }))
        .unwrap();
        assert_eq!(request.target_id(), 9);
    }

    #[test]
    fn graph_node_serializes_pascal_case() {
        let node = GraphNodeInfo {
            id: "n1".into(),
            name: "Task 1".into(),
            parent_id: "n-1".into(),
        };
        assert_eq!(
            serde_json::to_value(node).unwrap(),
            json!({ "Id": "n1", "Name": "Task 1", "ParentId": "n-1" })
        );
    }
}

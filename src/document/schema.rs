/// Canonical shape of a persisted workflow document
///
/// ```xml
/// <Workflow xmlns="urn:wexflow-schema" id="1" name="..." description="...">
///   <Settings>
///     <Setting name="launchType" value="periodic" />
///     <Setting name="enabled" value="true" />
///     <Setting name="period" value="00.00:05:00" />
///     <Setting name="cronExpression" value="" />
///   </Settings>
///   <Tasks>
///     <Task id="1" name="..." description="..." enabled="true">
///       <Setting name="..." value="..." extra="..." />
///     </Task>
///   </Tasks>
///   <ExecutionGraph> ... </ExecutionGraph>
/// </Workflow>
/// ```

use crate::document::element::Element;

/// Namespace of every element in a workflow document
pub const WORKFLOW_NS: &str = "urn:wexflow-schema";

/// `Some(WORKFLOW_NS)`, the form accepted by namespace-qualified queries
pub const NS: Option<&str> = Some(WORKFLOW_NS);

pub const WORKFLOW: &str = "Workflow";
pub const SETTINGS: &str = "Settings";
pub const SETTING: &str = "Setting";
pub const TASKS: &str = "Tasks";
pub const TASK: &str = "Task";
pub const EXECUTION_GRAPH: &str = "ExecutionGraph";

pub const ATTR_ID: &str = "id";
pub const ATTR_NAME: &str = "name";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_ENABLED: &str = "enabled";
pub const ATTR_VALUE: &str = "value";

/// Names of the workflow-level settings recognized in the `Settings` block
pub mod settings {
    pub const LAUNCH_TYPE: &str = "launchType";
    pub const ENABLED: &str = "enabled";
    pub const PERIOD: &str = "period";
    pub const CRON_EXPRESSION: &str = "cronExpression";
}

/// Lowercase boolean text used for every boolean attribute
pub fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Parse boolean attribute text, case-insensitively
pub fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A `<Setting name=".." value=".."/>` entry of the workflow `Settings` block
pub fn workflow_setting(name: &str, value: impl Into<String>) -> Element {
    Element::new_ns(NS, SETTING)
        .with_attribute(ATTR_NAME, name)
        .with_attribute(ATTR_VALUE, value)
}

/// Value of a workflow-level setting (`Settings/Setting[@name=..]/@value`)
pub fn setting_value<'a>(root: &'a Element, name: &str) -> Option<&'a str> {
    root.child(NS, SETTINGS)?
        .child_with_attribute(NS, SETTING, ATTR_NAME, name)?
        .attribute(ATTR_VALUE)
}

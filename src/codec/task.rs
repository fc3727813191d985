/// Task codec: one task descriptor <-> one `Task` element

use crate::codec::{setting, CodecError};
use crate::document::schema::{self, ATTR_DESCRIPTION, ATTR_ENABLED, ATTR_ID, ATTR_NAME, SETTING, TASK};
use crate::document::Element;
use crate::workflow::types::TaskInfo;

/// Build a `Task` element in `namespace` with one `Setting` child per setting
pub fn encode(task: &TaskInfo, namespace: Option<&str>) -> Element {
    let mut element = Element::new_ns(namespace, TASK)
        .with_attribute(ATTR_ID, task.id.to_string())
        .with_attribute(ATTR_NAME, task.name.as_str())
        .with_attribute(ATTR_DESCRIPTION, task.description.as_str())
        .with_attribute(ATTR_ENABLED, schema::bool_text(task.is_enabled));

    for setting in &task.settings {
        element.push_child(setting::encode(setting, namespace));
    }

    element
}

/// Read a `Task` element back into its descriptor
///
/// Settings are the `Setting` children in the task's own namespace.
pub fn decode(element: &Element) -> Result<TaskInfo, CodecError> {
    let id_text = element
        .attribute(ATTR_ID)
        .ok_or(CodecError::MissingAttribute(ATTR_ID))?;
    let id = id_text
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidAttribute(ATTR_ID, id_text.to_string()))?;

    let is_enabled = match element.attribute(ATTR_ENABLED) {
        Some(text) => schema::parse_bool(text)
            .ok_or_else(|| CodecError::InvalidAttribute(ATTR_ENABLED, text.to_string()))?,
        None => true,
    };

    let settings = element
        .children_named(element.namespace(), SETTING)
        .map(setting::decode)
        .collect();

    Ok(TaskInfo {
        id,
        name: element.attribute(ATTR_NAME).unwrap_or_default().to_string(),
        description: element.attribute(ATTR_DESCRIPTION).unwrap_or_default().to_string(),
        is_enabled,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::schema::NS;
    use crate::workflow::types::{AttributeInfo, SettingInfo};

    fn sample_task() -> TaskInfo {
        TaskInfo {
            id: 4,
            name: "FilesCopier".into(),
            description: "Copy files".into(),
            is_enabled: false,
            settings: vec![
                SettingInfo {
                    name: "selectFiles".into(),
                    value: Some("1".into()),
                    attributes: vec![],
                },
                SettingInfo {
                    name: "destFolder".into(),
                    value: Some("/out".into()),
                    attributes: vec![
                        AttributeInfo {
                            name: "timeout".into(),
                            value: "30".into(),
                        },
                        AttributeInfo {
                            name: "overwrite".into(),
                            value: "true".into(),
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn round_trips_through_xml() {
        let task = sample_task();
        let element = encode(&task, NS);

        assert_eq!(element.attribute("enabled"), Some("false"));
        assert_eq!(element.elements().count(), 2);
        assert_eq!(decode(&element).unwrap(), task);
    }

    #[test]
    fn round_trips_without_namespace() {
        let task = sample_task();
        assert_eq!(decode(&encode(&task, None)).unwrap(), task);
    }

    #[test]
    fn decode_rejects_bad_ids() {
        let missing = Element::new("Task").with_attribute("name", "x");
        assert!(matches!(decode(&missing), Err(CodecError::MissingAttribute("id"))));

        let invalid = Element::new("Task").with_attribute("id", "abc");
        assert!(matches!(decode(&invalid), Err(CodecError::InvalidAttribute("id", _))));
    }
}

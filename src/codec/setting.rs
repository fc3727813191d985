/// Setting codec: one task setting <-> one `Setting` element

use crate::document::schema::{ATTR_NAME, ATTR_VALUE, SETTING};
use crate::document::Element;
use crate::workflow::types::{AttributeInfo, SettingInfo};

/// Build a `Setting` element in `namespace`
///
/// `name` is always written; `value` only when non-empty. Extra attributes
/// follow in input order with set semantics, so a repeated name (even `name`
/// or `value`) overwrites the earlier one.
pub fn encode(setting: &SettingInfo, namespace: Option<&str>) -> Element {
    let mut element = Element::new_ns(namespace, SETTING).with_attribute(ATTR_NAME, setting.name.as_str());

    if let Some(value) = setting.value.as_deref().filter(|value| !value.is_empty()) {
        element.set_attribute(ATTR_VALUE, value);
    }

    for attribute in &setting.attributes {
        element.set_attribute(attribute.name.as_str(), attribute.value.as_str());
    }

    element
}

/// Read a `Setting` element back into its descriptor
///
/// Every attribute other than `name`, `value` and namespace declarations is
/// listed as an extra attribute, in document order.
pub fn decode(element: &Element) -> SettingInfo {
    let attributes = element
        .attributes()
        .iter()
        .filter(|attr| !is_reserved(&attr.name))
        .map(|attr| AttributeInfo {
            name: attr.name.clone(),
            value: attr.value.clone(),
        })
        .collect();

    SettingInfo {
        name: element.attribute(ATTR_NAME).unwrap_or_default().to_string(),
        value: element.attribute(ATTR_VALUE).map(str::to_string),
        attributes,
    }
}

fn is_reserved(name: &str) -> bool {
    name == ATTR_NAME || name == ATTR_VALUE || name == "xmlns" || name.starts_with("xmlns:")
}

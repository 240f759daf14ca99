//! Records fetched from the source repository

use crate::value::Value;

/// Slot carrying the record identifier
pub const ID_SLOT: &str = "id";
/// Slot carrying the display name
pub const NAME_SLOT: &str = "name";
/// Slot carrying the record's own class
pub const CLASS_NAME_SLOT: &str = "className";

/// One instance as returned by the record source.
///
/// `id`, `name` and `class_name` are lifted out of the slots when they are
/// strings; every slot, those three included, stays readable through
/// [`FetchedRecord::slot`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub class_name: String,
    /// Class this record was fetched under
    pub requested_class: String,
    slots: Vec<(String, Value)>,
}

impl FetchedRecord {
    /// Build a record from a raw JSON instance.
    ///
    /// `requested_class` is used when the instance does not name its own
    /// class. Anything other than a JSON object yields a record with no id.
    pub fn from_json(raw: serde_json::Value, requested_class: &str) -> Self {
        let slots = match Value::from(raw) {
            Value::Map(entries) => entries,
            _ => Vec::new(),
        };

        let string_slot = |key: &str| {
            slots
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.as_str())
                .map(str::to_string)
        };

        let id = string_slot(ID_SLOT);
        let name = string_slot(NAME_SLOT);
        let class_name =
            string_slot(CLASS_NAME_SLOT).unwrap_or_else(|| requested_class.to_string());

        Self {
            id,
            name,
            class_name,
            requested_class: requested_class.to_string(),
            slots,
        }
    }

    /// Value of a slot, if present
    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.slots.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Slot value when present and non-null
    pub fn present_slot(&self, name: &str) -> Option<&Value> {
        self.slot(name).filter(|v| !v.is_null())
    }

    /// Display name, empty when the record has none
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Ids of reference objects held by this record's field slots
    pub fn reference_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for (key, value) in &self.slots {
            if key == ID_SLOT || key == NAME_SLOT || key == CLASS_NAME_SLOT {
                continue;
            }
            value.collect_reference_ids(&mut ids);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_lifts_identity_slots() {
        let record = FetchedRecord::from_json(
            json!({"id": "w1", "name": "Gadget", "className": "Widget", "owner": {"id": "w2"}}),
            "Requested",
        );

        assert_eq!(record.id.as_deref(), Some("w1"));
        assert_eq!(record.display_name(), "Gadget");
        assert_eq!(record.class_name, "Widget");
        assert_eq!(record.requested_class, "Requested");
        assert_eq!(record.slot("id"), Some(&Value::Str("w1".into())));
        assert_eq!(record.reference_ids(), vec!["w2"]);
    }

    #[test]
    fn test_missing_class_name_falls_back_to_requested_class() {
        let record = FetchedRecord::from_json(json!({"id": "x"}), "Business_Capability");
        assert_eq!(record.class_name, "Business_Capability");
        assert_eq!(record.display_name(), "");
    }

    #[test]
    fn test_non_string_id_is_absent() {
        let record = FetchedRecord::from_json(json!({"id": 12, "name": "n"}), "C");
        assert!(record.id.is_none());

        let not_object = FetchedRecord::from_json(json!("scalar"), "C");
        assert!(not_object.id.is_none());
    }

    #[test]
    fn test_present_slot_skips_null() {
        let record = FetchedRecord::from_json(json!({"id": "a", "description": null}), "C");
        assert!(record.slot("description").is_some());
        assert!(record.present_slot("description").is_none());
        assert!(record.present_slot("missing").is_none());
    }
}

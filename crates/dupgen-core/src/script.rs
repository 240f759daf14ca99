//! Import script composition
//!
//! The script is written in two passes so any record may reference any
//! other regardless of fetch order:
//!
//! 1. creation: every record is created (or fetched) on the target and its
//!    name is set, binding it to its handle;
//! 2. population: the remaining selected fields are set, with references
//!    rendered as handles created in pass 1.

use std::collections::HashMap;

use crate::binder::{Bindings, ClassGroup};
use crate::value::Value;
use crate::literal::{escape, quoted, RenderContext};
use crate::record::{FetchedRecord, NAME_SLOT};
use crate::request::ClassPlan;

const RULE: &str = "# ========================================\n";

/// Composition phases, only ever advanced forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Header,
    CreationPass,
    PopulationPass,
    Done,
}

/// The generated import script, by section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub header: String,
    pub creation: String,
    pub population: String,
}

impl GeneratedDocument {
    /// Full script text
    pub fn text(&self) -> String {
        let mut out =
            String::with_capacity(self.header.len() + self.creation.len() + self.population.len());
        out.push_str(&self.header);
        out.push_str(&self.creation);
        out.push_str(&self.population);
        out
    }
}

/// Counts gathered while composing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptStats {
    pub classes: usize,
    pub records: usize,
    pub fields_emitted: usize,
    /// Selected fields left out because the record holds no value
    pub nulls_omitted: usize,
}

/// Document-level settings taken from the export request
#[derive(Debug, Clone, Copy)]
pub struct ScriptSettings<'a> {
    pub repository_name: &'a str,
    pub prefix: Option<&'a str>,
}

/// Compose the import script for bound records.
///
/// `plans` supplies the selected fields of each requested class.
pub fn compose(
    settings: ScriptSettings<'_>,
    plans: &[ClassPlan],
    bindings: &Bindings<'_>,
    ctx: &RenderContext<'_, '_>,
) -> (GeneratedDocument, ScriptStats) {
    let fields: HashMap<&str, &[String]> = plans
        .iter()
        .map(|p| (p.class_name.as_str(), p.fields.as_slice()))
        .collect();

    let mut composer = Composer {
        settings,
        fields,
        ctx,
        phase: Phase::Header,
        document: GeneratedDocument::default(),
        stats: ScriptStats::default(),
    };

    composer.header();
    composer.creation_pass(bindings.groups());
    composer.population_pass(bindings);
    composer.finish()
}

struct Composer<'c, 'm, 'b> {
    settings: ScriptSettings<'c>,
    fields: HashMap<&'c str, &'c [String]>,
    ctx: &'c RenderContext<'m, 'b>,
    phase: Phase,
    document: GeneratedDocument,
    stats: ScriptStats,
}

impl<'c> Composer<'c, '_, '_> {
    fn enter(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phase {:?} after {:?}", next, self.phase);
        tracing::trace!(from = ?self.phase, to = ?next, "script phase");
        self.phase = next;
    }

    fn header(&mut self) {
        let name = self.settings.repository_name;
        let out = &mut self.document.header;

        out.push_str("# DUP Export Script\n");
        out.push_str("# Generated by dupgen\n");
        out.push_str(&format!("# External Repository: {}\n", comment_text(name)));
        if let Some(prefix) = self.settings.prefix {
            out.push_str(&format!("# ID Transformation: {}_XXX\n", comment_text(prefix)));
        }
        out.push('\n');
        out.push_str("from java.lang import Boolean\n");
        out.push_str("from java.lang import Integer\n");
        out.push_str("from java.lang import Float\n");
        out.push_str("from java.lang import Double\n\n");
        out.push_str(&format!("defineExternalRepository(\"{}\", \"\")\n\n", escape(name)));
    }

    fn creation_pass(&mut self, groups: &[ClassGroup<'_>]) {
        self.enter(Phase::CreationPass);

        let repository = quoted(self.settings.repository_name);
        let out = &mut self.document.creation;

        out.push_str(RULE);
        out.push_str("# FIRST PASS: Create all instances\n");
        out.push_str(RULE);
        out.push('\n');

        for group in groups {
            out.push_str(&format!(
                "# Class: {} ({} instances)\n",
                comment_text(group.class_name),
                group.records.len()
            ));

            for record in &group.records {
                let Some(id) = record.id.as_deref() else {
                    continue;
                };
                let Some(handle) = self.ctx.handle(id) else {
                    continue;
                };
                let target = quoted(self.ctx.target_id(id));
                let name = quoted(record.display_name());

                out.push_str(&format!(
                    "{}=EssentialGetInstance('{}', {}, {}, {}, {})\n",
                    handle,
                    escape(group.class_name),
                    target,
                    name,
                    target,
                    repository
                ));
                out.push_str(&format!("addIfNotThere({}, 'name', {})\n", handle, name));
                self.stats.records += 1;
            }

            out.push('\n');
            self.stats.classes += 1;
        }
    }

    fn population_pass(&mut self, bindings: &Bindings<'_>) {
        self.enter(Phase::PopulationPass);

        let mut out = String::new();
        out.push_str(RULE);
        out.push_str("# SECOND PASS: Populate all fields\n");
        out.push_str(RULE);
        out.push('\n');

        for group in bindings.groups() {
            let copies: Vec<Vec<&FetchedRecord>> = group
                .records
                .iter()
                .map(|&record| bindings.copies(record))
                .collect();

            out.push_str(&format!(
                "# Class: {} - Adding fields\n",
                comment_text(group.class_name)
            ));
            out.push_str(&format!(
                "# Requested fields: {}\n\n",
                comment_text(&self.requested_fields(&copies).join(", "))
            ));

            for record in &copies {
                self.populate(&mut out, record);
            }

            out.push('\n');
        }

        self.document.population = out;
    }

    /// Emit the selected fields of one record, given every fetched copy of it
    fn populate(&mut self, out: &mut String, copies: &[&FetchedRecord]) {
        let Some(handle) = copies
            .first()
            .and_then(|record| record.id.as_deref())
            .and_then(|id| self.ctx.handle(id))
        else {
            return;
        };

        for field in self.fields_of(copies) {
            if field == NAME_SLOT {
                continue;
            }
            match present_in(copies, field) {
                Some(value) => {
                    out.push_str(&format!(
                        "addIfNotThere({}, '{}', {})\n",
                        handle,
                        escape(field),
                        self.ctx.render(value)
                    ));
                    self.stats.fields_emitted += 1;
                }
                None => self.stats.nulls_omitted += 1,
            }
        }
    }

    /// Ordered union of the selected fields of every class a record was
    /// requested under, then of its own class
    fn fields_of(&self, copies: &[&FetchedRecord]) -> Vec<&'c str> {
        let classes = copies
            .iter()
            .map(|record| record.requested_class.as_str())
            .chain(copies.first().map(|record| record.class_name.as_str()));

        let mut union: Vec<&'c str> = Vec::new();
        for class in classes {
            for field in self.fields.get(class).copied().unwrap_or(&[]) {
                if !union.contains(&field.as_str()) {
                    union.push(field);
                }
            }
        }
        union
    }

    /// Ordered union of the field lists of a group's records
    fn requested_fields(&self, records: &[Vec<&FetchedRecord>]) -> Vec<&'c str> {
        let mut union: Vec<&'c str> = Vec::new();
        for copies in records {
            for field in self.fields_of(copies) {
                if !union.contains(&field) {
                    union.push(field);
                }
            }
        }
        union
    }

    fn finish(mut self) -> (GeneratedDocument, ScriptStats) {
        self.enter(Phase::Done);
        (self.document, self.stats)
    }
}

/// First non-null value of `field` among the copies of a record
fn present_in<'r>(copies: &[&'r FetchedRecord], field: &str) -> Option<&'r Value> {
    copies.iter().find_map(|&record| record.present_slot(field))
}

/// Keep comment lines single-line
fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::IdentifierMap;
    use serde_json::json;

    fn plan(class: &str, fields: &[&str]) -> ClassPlan {
        ClassPlan {
            class_name: class.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn compose_for(
        records: &[FetchedRecord],
        plans: &[ClassPlan],
        prefix: Option<&str>,
    ) -> (String, ScriptStats) {
        let ids = IdentifierMap::for_records(records, prefix);
        let bindings = Bindings::bind(records);
        let ctx = RenderContext::new(&ids, &bindings);
        let settings = ScriptSettings {
            repository_name: "Test Repository",
            prefix,
        };
        let (doc, stats) = compose(settings, plans, &bindings, &ctx);
        (doc.text(), stats)
    }

    #[test]
    fn test_widget_scenario() {
        let records = vec![FetchedRecord::from_json(
            json!({"id": "w1", "name": "Gadget", "className": "Widget", "owner": {"id": "w2"}}),
            "Widget",
        )];
        let (text, stats) = compose_for(&records, &[plan("Widget", &["owner"])], Some("T"));

        assert!(text.contains(
            "Record_1=EssentialGetInstance('Widget', u'T_1', u'Gadget', u'T_1', u'Test Repository')\n"
        ));
        assert!(text.contains("addIfNotThere(Record_1, 'name', u'Gadget')\n"));
        assert!(text.contains("addIfNotThere(Record_1, 'owner', u'T_2')\n"));
        assert!(!text.contains("Record_2"));
        assert_eq!(stats.records, 1);
        assert_eq!(stats.fields_emitted, 1);
    }

    #[test]
    fn test_exact_layout() {
        let records = vec![
            FetchedRecord::from_json(
                json!({"id": "a", "name": "Alpha", "className": "Cap", "owner": {"id": "b"}, "size": 3}),
                "Cap",
            ),
            FetchedRecord::from_json(json!({"id": "b", "name": "Beta", "className": "Cap"}), "Cap"),
        ];
        let (text, _) = compose_for(&records, &[plan("Cap", &["name", "owner", "size"])], Some("P"));

        let expected = "\
# DUP Export Script
# Generated by dupgen
# External Repository: Test Repository
# ID Transformation: P_XXX

from java.lang import Boolean
from java.lang import Integer
from java.lang import Float
from java.lang import Double

defineExternalRepository(\"Test Repository\", \"\")

# ========================================
# FIRST PASS: Create all instances
# ========================================

# Class: Cap (2 instances)
Record_1=EssentialGetInstance('Cap', u'P_1', u'Alpha', u'P_1', u'Test Repository')
addIfNotThere(Record_1, 'name', u'Alpha')
Record_2=EssentialGetInstance('Cap', u'P_2', u'Beta', u'P_2', u'Test Repository')
addIfNotThere(Record_2, 'name', u'Beta')

# ========================================
# SECOND PASS: Populate all fields
# ========================================

# Class: Cap - Adding fields
# Requested fields: name, owner, size

addIfNotThere(Record_1, 'owner', Record_2)
addIfNotThere(Record_1, 'size', 3)

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_creation_precedes_every_reference() {
        let records = vec![
            FetchedRecord::from_json(
                json!({"id": "a", "className": "X", "peer": {"id": "c"}}),
                "X",
            ),
            FetchedRecord::from_json(json!({"id": "b", "className": "Y", "peer": "a"}), "Y"),
            FetchedRecord::from_json(json!({"id": "c", "className": "X", "peer": [{"id": "b"}]}), "X"),
        ];
        let plans = [plan("X", &["peer"]), plan("Y", &["peer"])];
        let (text, _) = compose_for(&records, &plans, None);

        let lines: Vec<&str> = text.lines().collect();
        for handle in ["Record_1", "Record_2", "Record_3"] {
            let created = lines
                .iter()
                .position(|l| l.starts_with(&format!("{}=", handle)))
                .unwrap();
            let named = lines
                .iter()
                .position(|l| l.starts_with(&format!("addIfNotThere({}, 'name'", handle)))
                .unwrap();
            assert!(created < named);
            for (i, line) in lines.iter().enumerate() {
                let as_value = line.ends_with(&format!(", {})", handle));
                if as_value && line.contains("'peer'") {
                    assert!(i > named, "{} referenced before creation", handle);
                }
            }
        }
    }

    #[test]
    fn test_null_fields_are_omitted() {
        let records = vec![FetchedRecord::from_json(
            json!({"id": "i", "className": "C", "description": null, "owner": "owner1"}),
            "C",
        )];
        let (text, stats) = compose_for(&records, &[plan("C", &["description", "owner", "missing"])], None);

        assert!(!text.contains("'description'"));
        assert!(!text.contains("'missing'"));
        assert!(text.contains("addIfNotThere(Record_1, 'owner', u'owner1')"));
        assert_eq!(stats.nulls_omitted, 2);
    }

    #[test]
    fn test_no_prefix_omits_transformation_comment() {
        let records = vec![FetchedRecord::from_json(json!({"id": "inst1", "className": "C"}), "C")];
        let (text, _) = compose_for(&records, &[plan("C", &["name"])], None);

        assert!(!text.contains("ID Transformation"));
        assert!(text.contains("u'inst1'"));
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let (text, stats) = compose_for(&[], &[plan("C", &["x"])], None);
        assert!(text.contains("defineExternalRepository"));
        assert!(!text.contains("EssentialGetInstance"));
        assert_eq!(stats, ScriptStats::default());
    }

    #[test]
    fn test_subclass_records_use_requested_class_fields() {
        let records = vec![FetchedRecord::from_json(
            json!({"id": "s", "name": "Sub", "className": "Special_Capability", "owner": "o"}),
            "Business_Capability",
        )];
        let (text, _) = compose_for(&records, &[plan("Business_Capability", &["owner"])], None);

        assert!(text.contains("EssentialGetInstance('Special_Capability'"));
        assert!(text.contains("# Requested fields: owner\n"));
        assert!(text.contains("addIfNotThere(Record_1, 'owner', u'o')"));
    }

    #[test]
    fn test_record_under_parent_and_child_keeps_both_field_lists() {
        let records = vec![
            FetchedRecord::from_json(
                json!({"id": "s1", "name": "Sub", "className": "Child", "description": "d"}),
                "Parent",
            ),
            FetchedRecord::from_json(
                json!({"id": "s1", "name": "Sub", "className": "Child", "childOnly": "c"}),
                "Child",
            ),
        ];
        let plans = [plan("Parent", &["description"]), plan("Child", &["childOnly"])];
        let (text, stats) = compose_for(&records, &plans, None);

        assert_eq!(text.matches("EssentialGetInstance(").count(), 1);
        assert!(text.contains("# Requested fields: description, childOnly\n"));
        assert!(text.contains("addIfNotThere(Record_1, 'description', u'd')\n"));
        assert!(text.contains("addIfNotThere(Record_1, 'childOnly', u'c')\n"));
        assert_eq!(stats.records, 1);
        assert_eq!(stats.fields_emitted, 2);
        assert_eq!(stats.nulls_omitted, 0);
    }

    #[test]
    fn test_own_class_fields_apply_to_subclass_records() {
        let records = vec![FetchedRecord::from_json(
            json!({"id": "s", "className": "Child", "owner": "o", "extra": 1}),
            "Parent",
        )];
        let plans = [plan("Parent", &["owner"]), plan("Child", &["extra"])];
        let (text, _) = compose_for(&records, &plans, None);

        assert!(text.contains("# Requested fields: owner, extra\n"));
        assert!(text.contains("addIfNotThere(Record_1, 'extra', 1)\n"));
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let records = vec![FetchedRecord::from_json(
            json!({
                "id": "i",
                "className": "C",
                "name": "Instance's \"Name\" with \n newline",
                "description": "Test with \\ backslash"
            }),
            "C",
        )];
        let (text, _) = compose_for(&records, &[plan("C", &["description"])], None);

        assert!(text.contains(r#"u'Instance\'s \"Name\" with \n newline'"#));
        assert!(text.contains(r"u'Test with \\ backslash'"));
    }

    #[test]
    fn test_phases_are_ordered() {
        assert!(Phase::Header < Phase::CreationPass);
        assert!(Phase::CreationPass < Phase::PopulationPass);
        assert!(Phase::PopulationPass < Phase::Done);
    }
}

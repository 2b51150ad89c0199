//! User-facing copy used by the engine.
//!
//! Each flow owns a [`FlowMessages`] catalog. Catalogs can be loaded from
//! YAML so that copy changes do not need a rebuild; absent keys keep their
//! defaults.

use serde::{Deserialize, Serialize};

/// Choice id for "edit the record".
pub const CHOICE_EDIT: &str = "registration_edit";
/// Choice id for "delete the record".
pub const CHOICE_DELETE: &str = "registration_delete";
/// Choice id for "cancel the registration".
pub const CHOICE_CANCEL: &str = "registration_cancel";

/// One selectable option of an interactive message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub title: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowMessages {
    /// `{summary}` is replaced by the draft summary.
    pub created: String,
    /// `{summary}` is replaced by the draft summary.
    pub updated: String,
    pub deleted: String,
    pub cancelled: String,
    pub record_not_found: String,
    pub missing_data_during_confirm: String,
    pub nothing_to_confirm: String,
    pub already_completed: String,
    pub edit_intro: String,
    pub edit_examples: Vec<String>,
    pub options_prompt: String,
    pub error_recovery_prompt: String,
    /// `{field}` and `{fields}` are replaced.
    pub invalid_field: String,
    pub edit_label: String,
    pub delete_label: String,
    pub cancel_label: String,
}

impl Default for FlowMessages {
    fn default() -> Self {
        Self {
            created: "Registered successfully!\n\n{summary}".to_string(),
            updated: "Record updated!\n\n{summary}".to_string(),
            deleted: "The record was deleted.".to_string(),
            cancelled: "Registration cancelled.".to_string(),
            record_not_found: "I couldn't find a record to change.".to_string(),
            missing_data_during_confirm:
                "Some information is still missing before I can register this.".to_string(),
            nothing_to_confirm: "There is no registration in progress to confirm.".to_string(),
            already_completed: "This registration is already saved.".to_string(),
            edit_intro: "Sure, what would you like to change?".to_string(),
            edit_examples: Vec::new(),
            options_prompt: "Do you want to change anything?".to_string(),
            error_recovery_prompt: "Would you like to edit the information or cancel?".to_string(),
            invalid_field:
                "I can't change '{field}'. These are the fields you can change:\n{fields}"
                    .to_string(),
            edit_label: "Edit".to_string(),
            delete_label: "Delete".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

impl FlowMessages {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn created_with(&self, summary: &str) -> String {
        self.created.replace("{summary}", summary)
    }

    pub fn updated_with(&self, summary: &str) -> String {
        self.updated.replace("{summary}", summary)
    }

    pub fn invalid_field_with(&self, field: &str, valid_fields: &str) -> String {
        self.invalid_field
            .replace("{field}", field)
            .replace("{fields}", valid_fields)
    }

    /// Edit intro followed by one bullet per example edit.
    pub fn edit_intro_with_examples(&self) -> String {
        if self.edit_examples.is_empty() {
            return self.edit_intro.clone();
        }
        let examples: Vec<String> = self
            .edit_examples
            .iter()
            .map(|example| format!("• {}", example))
            .collect();
        format!("{}\n\n{}", self.edit_intro, examples.join("\n"))
    }

    /// Options offered after a record was created or updated.
    pub fn record_choices(&self) -> Vec<Choice> {
        vec![
            Choice::new(CHOICE_EDIT, &self.edit_label),
            Choice::new(CHOICE_DELETE, &self.delete_label),
        ]
    }

    /// Options offered after a failed create/update.
    pub fn recovery_choices(&self) -> Vec<Choice> {
        vec![
            Choice::new(CHOICE_EDIT, &self.edit_label),
            Choice::new(CHOICE_CANCEL, &self.cancel_label),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_with_inserts_summary() {
        let messages = FlowMessages::default();
        assert!(messages.created_with("Quantity: 5").ends_with("Quantity: 5"));
    }

    #[test]
    fn yaml_overrides_keep_other_defaults() {
        let messages = FlowMessages::from_yaml_str(
            "cancelled: Registro cancelado.\nedit_examples:\n  - change the quantity to 3\n",
        )
        .unwrap();
        assert_eq!(messages.cancelled, "Registro cancelado.");
        assert_eq!(messages.deleted, FlowMessages::default().deleted);
        assert_eq!(messages.edit_examples, vec!["change the quantity to 3".to_string()]);
    }

    #[test]
    fn edit_intro_lists_examples() {
        let messages = FlowMessages {
            edit_examples: vec!["change the value to 30".into(), "change the date".into()],
            ..Default::default()
        };
        let intro = messages.edit_intro_with_examples();
        assert!(intro.starts_with(&messages.edit_intro));
        assert!(intro.contains("• change the value to 30\n• change the date"));
    }

    #[test]
    fn edit_intro_without_examples_is_plain() {
        let messages = FlowMessages::default();
        assert_eq!(messages.edit_intro_with_examples(), messages.edit_intro);
    }

    #[test]
    fn invalid_field_names_field_and_list() {
        let text = FlowMessages::default().invalid_field_with("colour", "• Quantity");
        assert!(text.contains("'colour'"));
        assert!(text.ends_with("• Quantity"));
    }

    #[test]
    fn choice_sets_use_stable_ids() {
        let messages = FlowMessages::default();
        let ids: Vec<String> = messages.record_choices().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CHOICE_EDIT.to_string(), CHOICE_DELETE.to_string()]);
        let ids: Vec<String> = messages.recovery_choices().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CHOICE_EDIT.to_string(), CHOICE_CANCEL.to_string()]);
    }
}

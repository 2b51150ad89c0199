//! Livestock death registration domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{format_date, parse_count, parse_date, parse_reference};
use crate::domain::foundation::RecordId;
use crate::domain::registration::{
    EntityRef, FieldName, FieldValue, FlowDraft, RegistrationStatus, ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathField {
    Quantity,
    AnimalCategory,
    Cause,
    DeathDate,
    Location,
}

impl FieldName for DeathField {
    const ALL: &'static [Self] = &[
        DeathField::Quantity,
        DeathField::AnimalCategory,
        DeathField::Cause,
        DeathField::DeathDate,
        DeathField::Location,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            DeathField::Quantity => "quantity",
            DeathField::AnimalCategory => "animal_category",
            DeathField::Cause => "cause",
            DeathField::DeathDate => "death_date",
            DeathField::Location => "location",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DeathField::Quantity => "Quantity",
            DeathField::AnimalCategory => "Animal category",
            DeathField::Cause => "Cause of death",
            DeathField::DeathDate => "Date of death",
            DeathField::Location => "Location",
        }
    }
}

pub const REQUIRED_DEATH_FIELDS: [DeathField; 4] = [
    DeathField::Quantity,
    DeathField::AnimalCategory,
    DeathField::Cause,
    DeathField::DeathDate,
];

/// Causes offered in the cause menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    Disease,
    Accident,
    Predator,
    BirthComplications,
    Unknown,
}

impl DeathCause {
    pub const ALL: [DeathCause; 5] = [
        DeathCause::Disease,
        DeathCause::Accident,
        DeathCause::Predator,
        DeathCause::BirthComplications,
        DeathCause::Unknown,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            DeathCause::Disease => "disease",
            DeathCause::Accident => "accident",
            DeathCause::Predator => "predator",
            DeathCause::BirthComplications => "birth_complications",
            DeathCause::Unknown => "unknown",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeathCause::Disease => "Disease",
            DeathCause::Accident => "Accident",
            DeathCause::Predator => "Predator",
            DeathCause::BirthComplications => "Birth complications",
            DeathCause::Unknown => "Unknown",
        }
    }

    /// Matches a menu id or a typed name.
    pub fn find(text: &str) -> Option<Self> {
        let needle = text.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|cause| {
                cause.id().eq_ignore_ascii_case(needle) || cause.name().eq_ignore_ascii_case(needle)
            })
    }

    pub fn to_ref(self) -> EntityRef {
        EntityRef::new(self.id(), self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathDraft {
    pub quantity: Option<u32>,
    pub animal_category: Option<EntityRef>,
    pub cause: Option<EntityRef>,
    pub death_date: Option<NaiveDate>,
    pub location: Option<EntityRef>,
    pub status: RegistrationStatus,
    pub record_id: Option<RecordId>,
}

impl DeathDraft {
    pub fn apply(&mut self, field: DeathField, value: &FieldValue) -> Result<(), ServiceError> {
        match field {
            DeathField::Quantity => self.quantity = Some(parse_count(field, value)?),
            DeathField::AnimalCategory => {
                self.animal_category = Some(parse_reference(field, value)?)
            }
            DeathField::Cause => self.cause = Some(Self::parse_cause(value)?),
            DeathField::DeathDate => self.death_date = Some(parse_date(field, value)?),
            DeathField::Location => self.location = Some(parse_reference(field, value)?),
        }
        Ok(())
    }

    /// Known causes are normalized to their menu entry; anything else is kept as typed.
    fn parse_cause(value: &FieldValue) -> Result<EntityRef, ServiceError> {
        let reference = parse_reference(DeathField::Cause, value)?;
        Ok(DeathCause::find(&reference.id)
            .or_else(|| DeathCause::find(&reference.name))
            .map(DeathCause::to_ref)
            .unwrap_or(reference))
    }

    pub fn is_set(&self, field: DeathField) -> bool {
        match field {
            DeathField::Quantity => self.quantity.is_some(),
            DeathField::AnimalCategory => self.animal_category.is_some(),
            DeathField::Cause => self.cause.is_some(),
            DeathField::DeathDate => self.death_date.is_some(),
            DeathField::Location => self.location.is_some(),
        }
    }

    pub fn missing_fields(&self) -> Vec<DeathField> {
        REQUIRED_DEATH_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.is_set(*field))
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec!["*Animal death*".to_string()];
        if let Some(quantity) = self.quantity {
            lines.push(format!("Quantity: {}", quantity));
        }
        if let Some(category) = &self.animal_category {
            lines.push(format!("Animal category: {}", category.name));
        }
        if let Some(cause) = &self.cause {
            lines.push(format!("Cause of death: {}", cause.name));
        }
        if let Some(date) = &self.death_date {
            lines.push(format!("Date of death: {}", format_date(date)));
        }
        if let Some(location) = &self.location {
            lines.push(format!("Location: {}", location.name));
        }
        lines.join("\n")
    }

    pub fn to_payload(&self) -> serde_json::Value {
        json!({
            "quantity": self.quantity,
            "animalCategoryId": self.animal_category.as_ref().map(|c| c.id.clone()),
            "cause": self.cause.as_ref().map(|c| c.id.clone()),
            "deathDate": self.death_date.map(|d| d.to_string()),
            "locationId": self.location.as_ref().map(|l| l.id.clone()),
        })
    }
}

impl FlowDraft for DeathDraft {
    fn status(&self) -> RegistrationStatus {
        self.status
    }

    fn set_status(&mut self, status: RegistrationStatus) {
        self.status = status;
    }

    fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_is_asked_first() {
        assert_eq!(DeathDraft::default().missing_fields().first(), Some(&DeathField::Quantity));
    }

    #[test]
    fn typed_cause_is_normalized_to_menu_entry() {
        let mut draft = DeathDraft::default();
        draft.apply(DeathField::Cause, &FieldValue::text("predator")).unwrap();
        assert_eq!(draft.cause, Some(DeathCause::Predator.to_ref()));
    }

    #[test]
    fn menu_cause_reference_is_normalized() {
        let mut draft = DeathDraft::default();
        draft
            .apply(DeathField::Cause, &FieldValue::reference("birth_complications", "x"))
            .unwrap();
        assert_eq!(draft.cause.unwrap().name, "Birth complications");
    }

    #[test]
    fn unknown_cause_text_is_kept() {
        let mut draft = DeathDraft::default();
        draft.apply(DeathField::Cause, &FieldValue::text("Lightning")).unwrap();
        assert_eq!(draft.cause, Some(EntityRef::new("lightning", "Lightning")));
    }

    #[test]
    fn quantity_must_be_whole() {
        let mut draft = DeathDraft::default();
        assert!(draft.apply(DeathField::Quantity, &FieldValue::Number(1.5)).is_err());
        draft.apply(DeathField::Quantity, &FieldValue::Number(5.0)).unwrap();
        assert_eq!(draft.quantity, Some(5));
    }

    #[test]
    fn summary_lists_set_fields_only() {
        let mut draft = DeathDraft::default();
        draft.apply(DeathField::Quantity, &FieldValue::Number(2.0)).unwrap();
        assert_eq!(draft.summary(), "*Animal death*\nQuantity: 2");
    }

    #[test]
    fn payload_uses_cause_id() {
        let mut draft = DeathDraft::default();
        draft.apply(DeathField::Cause, &FieldValue::text("Disease")).unwrap();
        assert_eq!(draft.to_payload()["cause"], "disease");
    }
}

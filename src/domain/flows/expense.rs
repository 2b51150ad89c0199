//! Expense registration domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{format_date, parse_date, parse_positive_number, parse_reference, parse_text};
use crate::domain::foundation::RecordId;
use crate::domain::registration::{
    EntityRef, FieldName, FieldValue, FlowDraft, RegistrationStatus, ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseField {
    Description,
    Value,
    Category,
    PaymentDate,
    Supplier,
}

impl FieldName for ExpenseField {
    const ALL: &'static [Self] = &[
        ExpenseField::Description,
        ExpenseField::Value,
        ExpenseField::Category,
        ExpenseField::PaymentDate,
        ExpenseField::Supplier,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ExpenseField::Description => "description",
            ExpenseField::Value => "value",
            ExpenseField::Category => "category",
            ExpenseField::PaymentDate => "payment_date",
            ExpenseField::Supplier => "supplier",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ExpenseField::Description => "Description",
            ExpenseField::Value => "Value",
            ExpenseField::Category => "Category",
            ExpenseField::PaymentDate => "Payment date",
            ExpenseField::Supplier => "Supplier",
        }
    }
}

/// Order in which missing required fields are asked.
pub const REQUIRED_EXPENSE_FIELDS: [ExpenseField; 4] = [
    ExpenseField::Value,
    ExpenseField::Category,
    ExpenseField::Description,
    ExpenseField::PaymentDate,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseDraft {
    pub description: Option<String>,
    pub value: Option<f64>,
    pub category: Option<EntityRef>,
    pub payment_date: Option<NaiveDate>,
    pub supplier: Option<EntityRef>,
    pub status: RegistrationStatus,
    pub record_id: Option<RecordId>,
}

impl ExpenseDraft {
    /// Validates and merges one value.
    pub fn apply(&mut self, field: ExpenseField, value: &FieldValue) -> Result<(), ServiceError> {
        match field {
            ExpenseField::Description => self.description = Some(parse_text(field, value)?),
            ExpenseField::Value => self.value = Some(parse_positive_number(field, value)?),
            ExpenseField::Category => self.category = Some(parse_reference(field, value)?),
            ExpenseField::PaymentDate => self.payment_date = Some(parse_date(field, value)?),
            ExpenseField::Supplier => self.supplier = Some(parse_reference(field, value)?),
        }
        Ok(())
    }

    pub fn is_set(&self, field: ExpenseField) -> bool {
        match field {
            ExpenseField::Description => self.description.is_some(),
            ExpenseField::Value => self.value.is_some(),
            ExpenseField::Category => self.category.is_some(),
            ExpenseField::PaymentDate => self.payment_date.is_some(),
            ExpenseField::Supplier => self.supplier.is_some(),
        }
    }

    pub fn missing_fields(&self) -> Vec<ExpenseField> {
        REQUIRED_EXPENSE_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.is_set(*field))
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec!["*Expense*".to_string()];
        if let Some(description) = &self.description {
            lines.push(format!("Description: {}", description));
        }
        if let Some(value) = self.value {
            lines.push(format!("Value: {:.2}", value));
        }
        if let Some(category) = &self.category {
            lines.push(format!("Category: {}", category.name));
        }
        if let Some(date) = &self.payment_date {
            lines.push(format!("Payment date: {}", format_date(date)));
        }
        if let Some(supplier) = &self.supplier {
            lines.push(format!("Supplier: {}", supplier.name));
        }
        lines.join("\n")
    }

    /// Body sent to the record API.
    pub fn to_payload(&self) -> serde_json::Value {
        json!({
            "description": self.description,
            "value": self.value,
            "categoryId": self.category.as_ref().map(|c| c.id.clone()),
            "paymentDate": self.payment_date.map(|d| d.to_string()),
            "supplierId": self.supplier.as_ref().map(|s| s.id.clone()),
        })
    }
}

impl FlowDraft for ExpenseDraft {
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

//! Flight form model
//!
//! Holds the raw value and interaction flags of every field and aggregates
//! the per-field validators into overall form validity.

use crate::types::{FieldName, FlightFormValues};
use crate::validation::{validate_field, FieldErrors, ValidationContext};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Interaction flags for one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    /// The user visited the field (or a submit attempt forced it)
    pub touched: bool,
    /// The value was changed since the last reset
    pub dirty: bool,
}

/// The flight intake form
#[derive(Debug, Clone)]
pub struct FlightForm {
    values: FlightFormValues,
    flags: [FieldFlags; FieldName::COUNT],
    context: ValidationContext,
}

impl FlightForm {
    /// Empty, untouched form validated against the local date
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_context(ValidationContext::local_today())
    }

    /// Empty form with an explicit validation context
    #[inline]
    #[must_use]
    pub fn with_context(context: ValidationContext) -> Self {
        Self {
            values: FlightFormValues::default(),
            flags: [FieldFlags::default(); FieldName::COUNT],
            context,
        }
    }

    /// Form pre-populated with raw values (all marked dirty)
    #[must_use]
    pub fn from_values(values: FlightFormValues, context: ValidationContext) -> Self {
        let mut form = Self::with_context(context);
        for field in FieldName::ALL {
            form.set_value(field, values.get(field));
        }
        form
    }

    /// Move the reference date used for arrival date checks
    #[inline]
    pub fn set_today(&mut self, today: NaiveDate) {
        self.context.today = today;
    }

    /// Current validation context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Set a field's raw value and mark it dirty
    pub fn set_value(&mut self, field: FieldName, value: impl Into<String>) {
        *self.values.get_mut(field) = value.into();
        self.flags_mut(field).dirty = true;
    }

    /// Raw value of a field
    #[inline]
    #[must_use]
    pub fn value(&self, field: FieldName) -> &str {
        self.values.get(field)
    }

    /// Snapshot of all raw values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FlightFormValues {
        &self.values
    }

    /// Interaction flags of a field
    #[inline]
    #[must_use]
    pub fn flags(&self, field: FieldName) -> FieldFlags {
        self.flags[Self::slot(field)]
    }

    /// Mark a field as touched
    #[inline]
    pub fn mark_touched(&mut self, field: FieldName) {
        self.flags_mut(field).touched = true;
    }

    /// Mark every field as touched without changing values
    pub fn mark_all_touched(&mut self) {
        for flags in &mut self.flags {
            flags.touched = true;
        }
    }

    /// Failures of one field, in display priority order
    #[inline]
    #[must_use]
    pub fn errors(&self, field: FieldName) -> FieldErrors {
        validate_field(field, self.value(field), &self.context)
    }

    /// Whether every field passes its validators
    #[must_use]
    pub fn is_valid(&self) -> bool {
        FieldName::ALL.iter().all(|f| self.errors(*f).is_empty())
    }

    /// Fields that currently fail validation
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<FieldName> {
        FieldName::ALL
            .into_iter()
            .filter(|f| !self.errors(*f).is_empty())
            .collect()
    }

    /// Whether a field's error should be displayed: invalid and interacted with
    #[must_use]
    pub fn should_show_error(&self, field: FieldName) -> bool {
        let flags = self.flags(field);
        (flags.touched || flags.dirty) && !self.errors(field).is_empty()
    }

    /// User-facing message for a field's first failure
    #[must_use]
    pub fn error_message(&self, field: FieldName) -> Option<String> {
        self.errors(field)
            .first()
            .map(|failure| field.message_for(*failure))
    }

    /// Messages for every displayable error, in form order
    #[must_use]
    pub fn visible_errors(&self) -> Vec<(FieldName, String)> {
        FieldName::ALL
            .into_iter()
            .filter(|f| self.should_show_error(*f))
            .filter_map(|f| self.error_message(f).map(|m| (f, m)))
            .collect()
    }

    /// Clear all values and flags
    pub fn reset(&mut self) {
        self.values = FlightFormValues::default();
        self.flags = [FieldFlags::default(); FieldName::COUNT];
    }

    #[inline]
    fn slot(field: FieldName) -> usize {
        field as usize
    }

    #[inline]
    fn flags_mut(&mut self, field: FieldName) -> &mut FieldFlags {
        &mut self.flags[Self::slot(field)]
    }
}

impl Default for FlightForm {
    fn default() -> Self {
        Self::new()
    }
}

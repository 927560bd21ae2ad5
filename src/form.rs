// =============================================================================
// DYNAMIC KEY/VALUE FORM MODULE
// =============================================================================
// A growable list of name/value rows, used to author attribute values and
// product attribute maps.
//
// ROW STATES:
// - Complete { name, value }: shows both fields
// - Pending { value }:        trailing row that shows only its value field;
//                             typing a name finalizes it into Complete
//
// Only the last row can be Pending. The form never holds zero rows.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FormRow {
    Complete { name: String, value: String },
    Pending { value: String },
}

impl FormRow {
    pub fn empty() -> Self {
        FormRow::Complete {
            name: String::new(),
            value: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormRow::Complete { name, .. } => name,
            FormRow::Pending { .. } => "",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            FormRow::Complete { value, .. } | FormRow::Pending { value } => value,
        }
    }

    /// Pending with something typed in its value field.
    pub fn is_partial(&self) -> bool {
        matches!(self, FormRow::Pending { value } if !value.is_empty())
    }

    fn is_blank(&self) -> bool {
        self.name().is_empty() && self.value().is_empty()
    }
}

/// Which cell an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Value,
}

/// A submitted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicKeyValueForm {
    rows: Vec<FormRow>,
}

impl Default for DynamicKeyValueForm {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicKeyValueForm {
    pub fn new() -> Self {
        Self {
            rows: vec![FormRow::empty()],
        }
    }

    /// Starts from existing pairs, e.g. when editing a saved entity.
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let rows: Vec<FormRow> = pairs
            .into_iter()
            .map(|(name, value)| FormRow::Complete {
                name: name.into(),
                value: value.into(),
            })
            .collect();
        if rows.is_empty() {
            Self::new()
        } else {
            Self { rows }
        }
    }

    pub fn rows(&self) -> &[FormRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(FormRow::is_blank)
    }

    /// The partial row, which is always the last one.
    pub fn partial_row(&self) -> Option<usize> {
        let last = self.rows.len().checked_sub(1)?;
        self.rows[last].is_partial().then_some(last)
    }

    /// Whether the row at `index` renders its name input.
    pub fn shows_name_field(&self, index: usize) -> bool {
        matches!(self.rows.get(index), Some(FormRow::Complete { .. }))
    }

    pub fn edit_cell(&mut self, index: usize, field: FormField, text: impl Into<String>) -> ClientResult<()> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or_else(|| ClientError::validation("row", format!("index {index} out of range ({len} rows)")))?;
        let text = text.into();

        match field {
            FormField::Value => match row {
                FormRow::Complete { value, .. } | FormRow::Pending { value } => *value = text,
            },
            FormField::Name => match row {
                FormRow::Complete { name, .. } => *name = text,
                FormRow::Pending { value } => {
                    if !text.is_empty() {
                        let value = std::mem::take(value);
                        *row = FormRow::Complete { name: text, value };
                    }
                }
            },
        }
        Ok(())
    }

    /// Promotes a trailing Pending row to Complete, then appends a new
    /// Pending row.
    pub fn add_row(&mut self) {
        if let Some(last) = self.rows.last_mut() {
            if let FormRow::Pending { value } = last {
                let value = std::mem::take(value);
                *last = FormRow::Complete {
                    name: String::new(),
                    value,
                };
            }
        }
        self.rows.push(FormRow::Pending {
            value: String::new(),
        });
    }

    /// Removes a row. Removing the only row resets the form instead.
    pub fn remove_row(&mut self, index: usize) -> ClientResult<()> {
        if index >= self.rows.len() {
            return Err(ClientError::validation(
                "row",
                format!("index {index} out of range ({} rows)", self.rows.len()),
            ));
        }
        if self.rows.len() == 1 {
            self.reset();
        } else {
            self.rows.remove(index);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.rows = vec![FormRow::empty()];
    }

    /// Every row with a name or a value, in order. Does not modify the form.
    pub fn submit(&self) -> Vec<NameValue> {
        self.rows
            .iter()
            .filter(|row| !row.is_blank())
            .map(|row| NameValue {
                name: row.name().to_string(),
                value: row.value().to_string(),
            })
            .collect()
    }

    /// Just the submitted values, for enumerations.
    pub fn values(&self) -> Vec<String> {
        self.submit()
            .into_iter()
            .map(|pair| pair.value)
            .filter(|value| !value.trim().is_empty())
            .collect()
    }
}

use serde::{Deserialize, Serialize};

/// A single selectable choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Label shown to the user
    pub label: String,
    /// Payload delivered back in the selection event
    pub payload: String,
}

/// Rows of choices attached to an outbound message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceKeyboard {
    pub rows: Vec<Vec<Choice>>,
}

impl ChoiceKeyboard {
    /// Lay out choices `per_row` at a time
    pub fn grid(choices: Vec<Choice>, per_row: usize) -> Self {
        let per_row = per_row.max(1);
        let mut rows = Vec::new();
        let mut row = Vec::with_capacity(per_row);
        for choice in choices {
            row.push(choice);
            if row.len() == per_row {
                rows.push(std::mem::take(&mut row));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
        Self { rows }
    }

    pub fn choices(&self) -> impl Iterator<Item = &Choice> {
        self.rows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

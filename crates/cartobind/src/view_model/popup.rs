//! Popup field display.

use crate::sdk::popup::Popup;

/// One row of a displayed popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupDisplayField {
    /// Position of the field in the popup.
    pub id: usize,
    pub name: String,
    pub value: String,
}

/// The rows of a popup, ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupViewModel {
    title: String,
    fields: Vec<PopupDisplayField>,
}

impl PopupViewModel {
    pub fn new(popup: &Popup) -> Self {
        let fields = popup
            .fields
            .iter()
            .enumerate()
            .map(|(id, field)| PopupDisplayField {
                id,
                name: if field.label.is_empty() {
                    field.id.clone()
                } else {
                    field.label.clone()
                },
                value: field.value.to_string(),
            })
            .collect();
        Self {
            title: popup.title.clone(),
            fields,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[PopupDisplayField] {
        &self.fields
    }
}

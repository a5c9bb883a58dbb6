//! Modal stack for managing overlays
//!
//! Only the top modal receives input.

use crate::services::exporter::ExportFormat;

/// What a name prompt will save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePurpose {
    SaveView,
    SaveInsight,
}

impl NamePurpose {
    pub fn title(&self) -> &'static str {
        match self {
            NamePurpose::SaveView => " Save as view ",
            NamePurpose::SaveInsight => " Create insight ",
        }
    }
}

/// Represents a modal overlay that can be displayed on top of the main UI
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Help dialog showing all keyboard shortcuts
    Help { scroll_offset: usize },
    /// New export form built from the job-trigger configuration
    ExportTrigger {
        field_index: usize,
        values: Vec<String>,
    },
    /// Name input for saving a view or an insight
    NamePrompt { purpose: NamePurpose, input: String },
    /// Results export format picker
    ExportFormat { selected: ExportFormat },
}

/// A stack of modal overlays
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Modal> {
        self.stack.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_stack_push_pop() {
        let mut stack = ModalStack::new();
        assert!(stack.top().is_none());

        stack.push(Modal::QuitConfirm);
        stack.push(Modal::Help { scroll_offset: 0 });

        assert_eq!(stack.pop(), Some(Modal::Help { scroll_offset: 0 }));
        assert_eq!(stack.pop(), Some(Modal::QuitConfirm));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_edit_prompt_in_place() {
        let mut stack = ModalStack::new();
        stack.push(Modal::NamePrompt {
            purpose: NamePurpose::SaveView,
            input: String::new(),
        });

        if let Some(Modal::NamePrompt { input, .. }) = stack.top_mut() {
            input.push_str("daily");
        }

        assert_eq!(
            stack.top(),
            Some(&Modal::NamePrompt {
                purpose: NamePurpose::SaveView,
                input: "daily".to_string()
            })
        );
    }
}

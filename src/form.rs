//! Form state behind the main window
//!
//! Holds what the user has typed and picked so far. The window reads and
//! mutates this between frames; `submit` turns it into an owned
//! `Submission` or reports why it can't.

use crate::submission::{Speed, Submission};
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Title of the dialog that reports a validation failure
pub const VALIDATION_DIALOG_TITLE: &str = "Input Error";

/// Reasons a submit click is rejected before anything is dispatched
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Text box is empty or directory not selected")]
    EmptyText,

    #[error("Text box is empty or directory not selected")]
    NoDirectory,
}

/// Editable form contents
#[derive(Debug, Clone, Default)]
pub struct Form {
    /// Free-form text, no length limit
    pub text: String,

    /// Currently selected speed
    pub speed: Speed,

    /// Destination directory, once one has been chosen
    directory: Option<PathBuf>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of the directory chooser
    ///
    /// `None` means the chooser was cancelled and the previous selection
    /// stays in place.
    pub fn set_directory(&mut self, chosen: Option<PathBuf>) {
        match chosen {
            Some(dir) => {
                debug!("Output directory selected: {}", dir.display());
                self.directory = Some(dir);
            }
            None => debug!("Directory chooser cancelled"),
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Validate and snapshot the form
    ///
    /// Only presence is checked: the directory is not probed for existence
    /// or write access here.
    pub fn submit(&self) -> Result<Submission, ValidationError> {
        if self.text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let directory = self.directory.clone().ok_or(ValidationError::NoDirectory)?;

        Ok(Submission::new(self.text.clone(), directory, self.speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let form = Form::new();
        assert!(form.text.is_empty());
        assert_eq!(form.speed, Speed::DEFAULT);
        assert!(form.directory().is_none());
    }

    #[test]
    fn test_cancel_keeps_directory() {
        let mut form = Form::new();
        form.set_directory(Some(PathBuf::from("/srv/audio")));
        form.set_directory(None);
        assert_eq!(form.directory(), Some(Path::new("/srv/audio")));

        form.set_directory(Some(PathBuf::from("/srv/other")));
        assert_eq!(form.directory(), Some(Path::new("/srv/other")));
    }

    #[test]
    fn test_empty_text_checked_first() {
        let form = Form::new();
        assert_eq!(form.submit(), Err(ValidationError::EmptyText));
    }

    #[test]
    fn test_validation_message() {
        assert_eq!(
            ValidationError::NoDirectory.to_string(),
            "Text box is empty or directory not selected"
        );
    }
}

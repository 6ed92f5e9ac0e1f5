//! Type conversions for FailoverError

use super::types::FailoverError;
use crate::core::selector::SelectionError;

impl From<SelectionError> for FailoverError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NoViableProvider { .. } => FailoverError::NoViableProvider(err.to_string()),
        }
    }
}

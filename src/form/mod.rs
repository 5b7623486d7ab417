//! The form data model and its edit-invariant logic.

pub mod editor;
pub mod label;
pub mod model;
pub mod reveal;

pub use editor::{EditError, FormEditor};
pub use model::{Choices, Form, Id, Question, QuestionBody, QuestionGroup, QuestionKind, ENTRY_GROUP_ID};
pub use reveal::{reveal_candidates, RevealPolicy, RevealTarget};

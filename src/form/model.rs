//! In-memory representation of a form: Form → QuestionGroup → Question,
//! plus the branching relation from groups/choices to target groups.
//!
//! The wire shape mirrors the backend exactly: camelCase fields, a `type`
//! tag on questions, epoch-second timestamps, and choices as an ordered
//! JSON object mapping option label to reveal target (null = selectable,
//! reveals nothing; id = reveals that group; absent key = not offered).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier shared by forms, groups, questions and departments.
pub type Id = u32;

/// The distinguished group every respondent must complete first.
/// It cannot be deleted and its id never changes.
pub const ENTRY_GROUP_ID: Id = 1;

/// Upper bound for a text question's auto-growing line count.
pub const MAX_TEXT_LINES: u8 = 8;

/// Option label → reveal target. Insertion order is the display order and
/// must survive serialization, hence indexmap rather than a hash map.
pub type Choices = IndexMap<String, Option<Id>>;

/// A versioned questionnaire definition tied to one recruitment cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_at: Option<DateTime<Utc>>,
    /// Null means "open from now".
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_at: Option<DateTime<Utc>>,
    /// Null means "open indefinitely".
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub children: Vec<QuestionGroup>,
}

/// A named, orderable page of a form. `next` unconditionally reveals
/// another group after this one completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub id: Id,
    pub label: String,
    #[serde(default)]
    pub children: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Id>,
}

/// A single question. Shared fields up front, variant payload flattened
/// behind the wire's `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Absent means required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(flatten)]
    pub body: QuestionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionBody {
    #[serde(rename = "text")]
    Text {
        /// Maximum auto-growing line count, 1..=MAX_TEXT_LINES.
        #[serde(rename = "maxLine", default, skip_serializing_if = "Option::is_none")]
        max_line: Option<u8>,
    },
    #[serde(rename = "choice")]
    Choice {
        choices: Choices,
        #[serde(rename = "maxSelection", default, skip_serializing_if = "Option::is_none")]
        max_selection: Option<u32>,
    },
    /// Options are derived from the organization's department list; the
    /// choices keys are stringified department ids.
    #[serde(rename = "choice-depart")]
    ChoiceDepart {
        choices: Choices,
        #[serde(rename = "maxSelection", default, skip_serializing_if = "Option::is_none")]
        max_selection: Option<u32>,
    },
}

/// The three question variants, used where only the tag matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    Choice,
    ChoiceDepart,
}

impl std::str::FromStr for QuestionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(QuestionKind::Text),
            "choice" => Ok(QuestionKind::Choice),
            "choice-depart" => Ok(QuestionKind::ChoiceDepart),
            other => anyhow::bail!("unknown question type: {}", other),
        }
    }
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self.body {
            QuestionBody::Text { .. } => QuestionKind::Text,
            QuestionBody::Choice { .. } => QuestionKind::Choice,
            QuestionBody::ChoiceDepart { .. } => QuestionKind::ChoiceDepart,
        }
    }

    pub fn required(&self) -> bool {
        !self.optional.unwrap_or(false)
    }

    /// Choices map of a choice-like question, if any.
    pub fn choices(&self) -> Option<&Choices> {
        match &self.body {
            QuestionBody::Choice { choices, .. } | QuestionBody::ChoiceDepart { choices, .. } => {
                Some(choices)
            }
            QuestionBody::Text { .. } => None,
        }
    }

    /// Effective max-selection: explicit value, else the option count.
    pub fn max_selection(&self) -> Option<u32> {
        match &self.body {
            QuestionBody::Choice { choices, max_selection }
            | QuestionBody::ChoiceDepart { choices, max_selection } => {
                Some(max_selection.unwrap_or(choices.len() as u32))
            }
            QuestionBody::Text { .. } => None,
        }
    }
}

impl Form {
    pub fn group(&self, id: Id) -> Option<&QuestionGroup> {
        self.children.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: Id) -> Option<&mut QuestionGroup> {
        self.children.iter_mut().find(|g| g.id == id)
    }

    pub fn has_group(&self, id: Id) -> bool {
        self.group(id).is_some()
    }

    pub fn group_labels(&self) -> Vec<&str> {
        self.children.iter().map(|g| g.label.as_str()).collect()
    }

    pub fn max_group_id(&self) -> Id {
        self.children.iter().map(|g| g.id).max().unwrap_or(0)
    }

    /// Question ids are unique within the whole form, so the maximum spans
    /// every group.
    pub fn max_question_id(&self) -> Id {
        self.children
            .iter()
            .flat_map(|g| g.children.iter())
            .map(|q| q.id)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choice_question() -> Question {
        let mut choices = Choices::new();
        choices.insert("选项1".to_string(), None);
        choices.insert("选项2".to_string(), Some(5));
        Question {
            id: 7,
            title: "方向选择".to_string(),
            desc: None,
            optional: Some(true),
            body: QuestionBody::Choice { choices, max_selection: Some(1) },
        }
    }

    #[test]
    fn question_wire_shape() {
        let value = serde_json::to_value(choice_question()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "方向选择",
                "optional": true,
                "type": "choice",
                "choices": {"选项1": null, "选项2": 5},
                "maxSelection": 1
            })
        );
    }

    #[test]
    fn question_roundtrip_preserves_option_order() {
        let json = r#"{"id":1,"title":"t","type":"choice","choices":{"b":null,"a":2,"c":null}}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        let labels: Vec<&String> = q.choices().unwrap().keys().collect();
        assert_eq!(labels, ["b", "a", "c"]);
    }

    #[test]
    fn text_question_defaults() {
        let q: Question = serde_json::from_str(r#"{"id":3,"title":"新问题","type":"text"}"#).unwrap();
        assert_eq!(q.kind(), QuestionKind::Text);
        assert!(q.required());
        assert_eq!(q.choices(), None);
        assert_eq!(q.max_selection(), None);
    }

    #[test]
    fn form_timestamps_are_epoch_seconds() {
        let form: Form = serde_json::from_str(
            r#"{"id":9,"name":"2024秋纳新","startAt":1700000000,"children":[]}"#,
        )
        .unwrap();
        assert_eq!(form.start_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(form.end_at, None);
        let back = serde_json::to_value(&form).unwrap();
        assert_eq!(back["startAt"], json!(1_700_000_000));
        assert!(back.get("endAt").is_none());
    }

    #[test]
    fn max_ids_span_all_groups() {
        let form = Form {
            id: 1,
            name: "f".into(),
            desc: String::new(),
            create_at: None,
            start_at: None,
            end_at: None,
            children: vec![
                QuestionGroup {
                    id: 1,
                    label: "问题组1".into(),
                    children: vec![choice_question()],
                    next: None,
                },
                QuestionGroup { id: 4, label: "问题组2".into(), children: vec![], next: None },
            ],
        };
        assert_eq!(form.max_group_id(), 4);
        assert_eq!(form.max_question_id(), 7);
    }
}

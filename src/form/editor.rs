//! Staging of structural form edits. Every operation is pure: it returns
//! a new editor value and leaves the previous one untouched, so the prior
//! snapshot stays valid for rollback when a persist call fails.

use thiserror::Error;

use super::label::{move_element, new_unique_label};
use super::model::{
    Choices, Form, Id, Question, QuestionBody, QuestionGroup, QuestionKind, ENTRY_GROUP_ID,
    MAX_TEXT_LINES,
};
use super::reveal::{reaches, RevealPolicy, RevealTarget};
use crate::org::Depart;

/// Label prefix for freshly created question groups.
pub const GROUP_LABEL_PREFIX: &str = "问题组";
/// Label prefix for freshly created choice options.
pub const OPTION_LABEL_PREFIX: &str = "选项";
/// Title given to a freshly created question.
pub const NEW_QUESTION_TITLE: &str = "新问题";
/// Title substituted when a variant switch leaves the title empty.
pub const DEFAULT_QUESTION_TITLE: &str = "问题标题";

/// Number of options (and the max-selection) seeded on a switch to
/// `choice`; `choice-depart` seeds `min(3, departments)`.
const SEED_CHOICE_COUNT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("问题组 {0} 不存在")]
    GroupNotFound(Id),
    #[error("入口问题组不可删除")]
    EntryGroupImmutable,
    #[error("问题组 {group} 中不存在第 {index} 题")]
    QuestionIndexOutOfBounds { group: Id, index: usize },
    #[error("问题组不可揭示自身")]
    SelfReveal,
    #[error("揭示目标问题组 {0} 不存在")]
    UnknownRevealTarget(Id),
    #[error("该揭示会构成循环 (经过问题组 {0})")]
    RevealCycle(Id),
    #[error("此问题不是选择题")]
    NotAChoiceQuestion,
    #[error("选项名重复")]
    DuplicateOptionLabel(String),
    #[error("至少保留1个选项")]
    LastOption,
    #[error("选项 {0} 不存在")]
    OptionNotFound(String),
    #[error("此题型的选项不可隐藏")]
    HideNotAllowed,
    #[error("最多选择项数须在 1~{max} 之间")]
    MaxSelectionOutOfRange { max: u32 },
    #[error("最大扩容行数须在 1~{0} 之间")]
    MaxLineOutOfRange(u8),
}

/// Client-side working copy of a form's group/question tree.
///
/// Id allocation is counter-backed rather than rescanned per edit; the
/// counters are kept equal to `max existing + 1` across deletions, so an
/// add always yields one past the current maximum.
#[derive(Debug, Clone)]
pub struct FormEditor {
    form: Form,
    next_group_id: Id,
    next_question_id: Id,
    policy: RevealPolicy,
}

impl FormEditor {
    /// Seed the id counters with one scan of the loaded tree.
    pub fn new(form: Form, policy: RevealPolicy) -> Self {
        let next_group_id = form.max_group_id() + 1;
        let next_question_id = form.max_question_id() + 1;
        Self { form, next_group_id, next_question_id, policy }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn into_form(self) -> Form {
        self.form
    }

    pub fn policy(&self) -> RevealPolicy {
        self.policy
    }

    /// Append a new empty group with a generated unique label.
    pub fn add_group(&self) -> FormEditor {
        let mut next = self.clone();
        let labels = self.form.group_labels();
        let group = QuestionGroup {
            id: next.next_group_id,
            label: new_unique_label(&labels, GROUP_LABEL_PREFIX),
            children: vec![],
            next: None,
        };
        next.next_group_id += 1;
        next.form.children.push(group);
        next
    }

    /// Replace the label of one group, leaving the rest untouched.
    pub fn rename_group(&self, id: Id, label: impl Into<String>) -> Result<FormEditor, EditError> {
        let mut next = self.clone();
        let group = next.form.group_mut(id).ok_or(EditError::GroupNotFound(id))?;
        group.label = label.into();
        Ok(next)
    }

    /// Point a group's unconditional `next` at another group (or clear it).
    pub fn set_group_next(&self, id: Id, target: Option<Id>) -> Result<FormEditor, EditError> {
        if !self.form.has_group(id) {
            return Err(EditError::GroupNotFound(id));
        }
        if let Some(target) = target {
            self.check_reveal_edge(id, target)?;
        }
        let mut next = self.clone();
        next.form.group_mut(id).expect("checked above").next = target;
        if self.policy == RevealPolicy::RejectCycles {
            if let Some(target) = target {
                if reaches(&next.form, target, id) {
                    return Err(EditError::RevealCycle(target));
                }
            }
        }
        Ok(next)
    }

    /// Remove a group and its questions. The entry group is protected.
    /// Every `next` and choice reveal pointing at the removed group is
    /// nulled out in the same edit, so no reference dangles.
    pub fn delete_group(&self, id: Id) -> Result<FormEditor, EditError> {
        if id == ENTRY_GROUP_ID {
            return Err(EditError::EntryGroupImmutable);
        }
        if !self.form.has_group(id) {
            return Err(EditError::GroupNotFound(id));
        }
        let mut next = self.clone();
        next.form.children.retain(|g| g.id != id);
        for group in &mut next.form.children {
            if group.next == Some(id) {
                group.next = None;
            }
            for question in &mut group.children {
                if let QuestionBody::Choice { choices, .. }
                | QuestionBody::ChoiceDepart { choices, .. } = &mut question.body
                {
                    for reveal in choices.values_mut() {
                        if *reveal == Some(id) {
                            *reveal = None;
                        }
                    }
                }
            }
        }
        if id + 1 == next.next_group_id {
            next.next_group_id = next.form.max_group_id() + 1;
        }
        Ok(next)
    }

    /// Append a default text question to a group.
    pub fn add_question(&self, group_id: Id) -> Result<FormEditor, EditError> {
        let mut next = self.clone();
        let id = next.next_question_id;
        let group = next.form.group_mut(group_id).ok_or(EditError::GroupNotFound(group_id))?;
        group.children.push(Question {
            id,
            title: NEW_QUESTION_TITLE.to_string(),
            desc: None,
            optional: None,
            body: QuestionBody::Text { max_line: None },
        });
        next.next_question_id += 1;
        Ok(next)
    }

    /// Replace the question at `index` with an edited draft. The draft's
    /// reveal targets are validated against the tree before the swap.
    pub fn replace_question(
        &self,
        group_id: Id,
        index: usize,
        question: Question,
    ) -> Result<FormEditor, EditError> {
        self.check_question_index(group_id, index)?;
        if let Some(choices) = question.choices() {
            for target in choices.values().flatten() {
                self.check_reveal_edge(group_id, *target)?;
            }
        }
        let mut next = self.clone();
        next.form.group_mut(group_id).expect("checked above").children[index] = question;
        if self.policy == RevealPolicy::RejectCycles {
            let targets: Vec<Id> = next.form.group(group_id).expect("checked above").children
                [index]
                .choices()
                .map(|c| c.values().flatten().copied().collect())
                .unwrap_or_default();
            for target in targets {
                if reaches(&next.form, target, group_id) {
                    return Err(EditError::RevealCycle(target));
                }
            }
        }
        Ok(next)
    }

    /// Remove the question at `index` from a group.
    pub fn delete_question(&self, group_id: Id, index: usize) -> Result<FormEditor, EditError> {
        self.check_question_index(group_id, index)?;
        let mut next = self.clone();
        let removed = next.form.group_mut(group_id).expect("checked above").children.remove(index);
        if removed.id + 1 == next.next_question_id {
            next.next_question_id = next.form.max_question_id() + 1;
        }
        Ok(next)
    }

    /// Move the question at `index` by `delta` positions within its group,
    /// clamped to the list bounds.
    pub fn move_question(
        &self,
        group_id: Id,
        index: usize,
        delta: isize,
    ) -> Result<FormEditor, EditError> {
        self.check_question_index(group_id, index)?;
        let mut next = self.clone();
        let group = next.form.group_mut(group_id).expect("checked above");
        group.children = move_element(&group.children, index, delta);
        Ok(next)
    }

    fn check_question_index(&self, group_id: Id, index: usize) -> Result<(), EditError> {
        let group = self.form.group(group_id).ok_or(EditError::GroupNotFound(group_id))?;
        if index >= group.children.len() {
            return Err(EditError::QuestionIndexOutOfBounds { group: group_id, index });
        }
        Ok(())
    }

    /// Shared structural checks for an edge `from → target`: the target
    /// must exist and must not be the revealing group itself.
    fn check_reveal_edge(&self, from: Id, target: Id) -> Result<(), EditError> {
        if target == from {
            return Err(EditError::SelfReveal);
        }
        if !self.form.has_group(target) {
            return Err(EditError::UnknownRevealTarget(target));
        }
        Ok(())
    }
}

impl Question {
    /// Switch the question's variant, seeding the variant defaults: 3
    /// plain options for `choice`, one option per department for
    /// `choice-depart`. A no-op when the kind is unchanged.
    pub fn with_kind(&self, kind: QuestionKind, departs: &[Depart]) -> Question {
        if kind == self.kind() {
            return self.clone();
        }
        let mut next = self.clone();
        next.body = match kind {
            QuestionKind::Text => QuestionBody::Text { max_line: None },
            QuestionKind::Choice => {
                let mut choices = Choices::new();
                for n in 1..=SEED_CHOICE_COUNT {
                    choices.insert(format!("{}{}", OPTION_LABEL_PREFIX, n), None);
                }
                QuestionBody::Choice { choices, max_selection: Some(SEED_CHOICE_COUNT) }
            }
            QuestionKind::ChoiceDepart => {
                let mut choices = Choices::new();
                for depart in departs {
                    choices.insert(depart.id.to_string(), None);
                }
                QuestionBody::ChoiceDepart {
                    choices,
                    max_selection: Some(SEED_CHOICE_COUNT.min(departs.len() as u32)),
                }
            }
        };
        if next.title.is_empty() {
            next.title = DEFAULT_QUESTION_TITLE.to_string();
        }
        next
    }

    /// Add a uniquely-labeled option revealing nothing. Only plain choice
    /// questions have free-form options; department options mirror the
    /// roster instead.
    pub fn add_option(&self) -> Result<Question, EditError> {
        let mut next = self.clone();
        match &mut next.body {
            QuestionBody::Choice { choices, .. } => {
                let labels: Vec<&str> = choices.keys().map(String::as_str).collect();
                let label = new_unique_label(&labels, OPTION_LABEL_PREFIX);
                choices.insert(label, None);
                Ok(next)
            }
            _ => Err(EditError::NotAChoiceQuestion),
        }
    }

    /// Rename an option, preserving its position. Rejected when the new
    /// label matches any present option label.
    pub fn rename_option(&self, old: &str, new: &str) -> Result<Question, EditError> {
        let mut next = self.clone();
        match &mut next.body {
            QuestionBody::Choice { choices, .. } => {
                let index =
                    choices.get_index_of(old).ok_or_else(|| EditError::OptionNotFound(old.into()))?;
                if choices.contains_key(new) {
                    return Err(EditError::DuplicateOptionLabel(new.into()));
                }
                let mut renamed = Choices::with_capacity(choices.len());
                for (i, (label, reveal)) in choices.iter().enumerate() {
                    if i == index {
                        renamed.insert(new.to_string(), *reveal);
                    } else {
                        renamed.insert(label.clone(), *reveal);
                    }
                }
                *choices = renamed;
                Ok(next)
            }
            _ => Err(EditError::NotAChoiceQuestion),
        }
    }

    /// Remove an option. The last remaining option cannot be removed.
    pub fn remove_option(&self, label: &str) -> Result<Question, EditError> {
        let mut next = self.clone();
        match &mut next.body {
            QuestionBody::Choice { choices, .. } => {
                if !choices.contains_key(label) {
                    return Err(EditError::OptionNotFound(label.into()));
                }
                if choices.len() <= 1 {
                    return Err(EditError::LastOption);
                }
                choices.shift_remove(label);
                Ok(next)
            }
            _ => Err(EditError::NotAChoiceQuestion),
        }
    }

    /// Set one option's reveal value. `Hidden` removes the key and is only
    /// meaningful for department choices, whose hidden options are simply
    /// absent from the map.
    pub fn set_option_reveal(
        &self,
        label: &str,
        target: RevealTarget,
    ) -> Result<Question, EditError> {
        let mut next = self.clone();
        match &mut next.body {
            QuestionBody::Choice { choices, .. } => match target {
                RevealTarget::Hidden => Err(EditError::HideNotAllowed),
                RevealTarget::None | RevealTarget::Group(_) => {
                    if !choices.contains_key(label) {
                        return Err(EditError::OptionNotFound(label.into()));
                    }
                    choices.insert(label.to_string(), target.group());
                    Ok(next)
                }
            },
            QuestionBody::ChoiceDepart { choices, .. } => {
                match target {
                    RevealTarget::Hidden => {
                        choices.shift_remove(label);
                    }
                    RevealTarget::None | RevealTarget::Group(_) => {
                        choices.insert(label.to_string(), target.group());
                    }
                }
                Ok(next)
            }
            QuestionBody::Text { .. } => Err(EditError::NotAChoiceQuestion),
        }
    }

    /// Bound and set the max-selection count of a choice-like question.
    pub fn set_max_selection(&self, value: u32) -> Result<Question, EditError> {
        let mut next = self.clone();
        match &mut next.body {
            QuestionBody::Choice { choices, max_selection }
            | QuestionBody::ChoiceDepart { choices, max_selection } => {
                let max = choices.len() as u32;
                if value == 0 || value > max {
                    return Err(EditError::MaxSelectionOutOfRange { max });
                }
                *max_selection = Some(value);
                Ok(next)
            }
            QuestionBody::Text { .. } => Err(EditError::NotAChoiceQuestion),
        }
    }

    /// Bound and set a text question's auto-growing line count.
    pub fn set_max_line(&self, value: u8) -> Result<Question, EditError> {
        let mut next = self.clone();
        match &mut next.body {
            QuestionBody::Text { max_line } => {
                if value == 0 || value > MAX_TEXT_LINES {
                    return Err(EditError::MaxLineOutOfRange(MAX_TEXT_LINES));
                }
                *max_line = Some(value);
                Ok(next)
            }
            _ => Err(EditError::NotAChoiceQuestion),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> Form {
        Form {
            id: 1,
            name: "2024秋纳新".into(),
            desc: String::new(),
            create_at: None,
            start_at: None,
            end_at: None,
            children: vec![QuestionGroup {
                id: ENTRY_GROUP_ID,
                label: "问题组1".into(),
                children: vec![],
                next: None,
            }],
        }
    }

    fn editor() -> FormEditor {
        FormEditor::new(base_form(), RevealPolicy::RejectCycles)
    }

    #[test]
    fn add_group_assigns_max_plus_one() {
        let e = editor().add_group().add_group();
        let ids: Vec<Id> = e.form().children.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let labels = e.form().group_labels();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.iter().collect::<std::collections::HashSet<_>>().len(), 3);
    }

    #[test]
    fn add_group_after_delete_still_max_plus_one() {
        let e = editor().add_group().add_group();
        let e = e.delete_group(3).unwrap();
        let e = e.add_group();
        assert_eq!(e.form().max_group_id(), 3);
    }

    #[test]
    fn entry_group_cannot_be_deleted() {
        let e = editor();
        assert_eq!(e.delete_group(ENTRY_GROUP_ID).unwrap_err(), EditError::EntryGroupImmutable);
        assert!(e.form().has_group(ENTRY_GROUP_ID));
    }

    #[test]
    fn delete_group_nulls_dangling_reveals() {
        let e = editor().add_group().add_group(); // groups 1, 2, 3
        let e = e.set_group_next(1, Some(3)).unwrap();
        let e = e.add_question(2).unwrap();
        let q = e.form().group(2).unwrap().children[0]
            .with_kind(QuestionKind::Choice, &[])
            .set_option_reveal("选项1", RevealTarget::Group(3))
            .unwrap();
        let e = e.replace_question(2, 0, q).unwrap();

        let e = e.delete_group(3).unwrap();
        assert_eq!(e.form().group(1).unwrap().next, None);
        let choices = e.form().group(2).unwrap().children[0].choices().unwrap();
        assert_eq!(choices["选项1"], None);
    }

    #[test]
    fn question_ids_are_unique_across_groups() {
        let e = editor().add_group();
        let e = e.add_question(1).unwrap().add_question(2).unwrap();
        let e = e.add_question(1).unwrap();
        let ids: Vec<Id> = e
            .form()
            .children
            .iter()
            .flat_map(|g| g.children.iter().map(|q| q.id))
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn self_reveal_is_rejected() {
        let e = editor();
        assert_eq!(e.set_group_next(1, Some(1)).unwrap_err(), EditError::SelfReveal);
    }

    #[test]
    fn unknown_reveal_target_is_rejected() {
        let e = editor();
        assert_eq!(e.set_group_next(1, Some(9)).unwrap_err(), EditError::UnknownRevealTarget(9));
    }

    #[test]
    fn cycle_rejected_by_default_policy() {
        let e = editor().add_group().add_group();
        let e = e.set_group_next(1, Some(2)).unwrap();
        let e = e.set_group_next(2, Some(3)).unwrap();
        assert_eq!(e.set_group_next(3, Some(1)).unwrap_err(), EditError::RevealCycle(1));
    }

    #[test]
    fn cycle_allowed_under_allow_policy() {
        let e = FormEditor::new(base_form(), RevealPolicy::AllowCycles).add_group();
        let e = e.set_group_next(1, Some(2)).unwrap();
        let e = e.set_group_next(2, Some(1)).unwrap();
        assert_eq!(e.form().group(2).unwrap().next, Some(1));
    }

    #[test]
    fn move_question_clamps() {
        let e = editor();
        let e = e.add_question(1).unwrap().add_question(1).unwrap();
        let e = e.move_question(1, 0, 10).unwrap();
        let ids: Vec<Id> = e.form().group(1).unwrap().children.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 1]);
        let e = e.move_question(1, 1, 0).unwrap();
        let ids: Vec<Id> = e.form().group(1).unwrap().children.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn variant_switch_seeds_choice_defaults() {
        let e = editor().add_question(1).unwrap();
        let q = e.form().group(1).unwrap().children[0].with_kind(QuestionKind::Choice, &[]);
        let choices = q.choices().unwrap();
        assert_eq!(choices.keys().collect::<Vec<_>>(), ["选项1", "选项2", "选项3"]);
        assert!(choices.values().all(Option::is_none));
        assert_eq!(q.max_selection(), Some(3));
    }

    #[test]
    fn variant_switch_seeds_departs() {
        let departs = vec![
            Depart { id: 11, name: "技术部".into(), created_at: None },
            Depart { id: 12, name: "宣传部".into(), created_at: None },
        ];
        let e = editor().add_question(1).unwrap();
        let q =
            e.form().group(1).unwrap().children[0].with_kind(QuestionKind::ChoiceDepart, &departs);
        let choices = q.choices().unwrap();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices.keys().collect::<Vec<_>>(), ["11", "12"]);
        assert!(choices.values().all(Option::is_none));
        assert_eq!(q.max_selection(), Some(2));
    }

    #[test]
    fn option_rename_rejects_duplicates() {
        let e = editor().add_question(1).unwrap();
        let q = e.form().group(1).unwrap().children[0].with_kind(QuestionKind::Choice, &[]);
        assert_eq!(
            q.rename_option("选项1", "选项2"),
            Err(EditError::DuplicateOptionLabel("选项2".into()))
        );
        let renamed = q.rename_option("选项1", "其他").unwrap();
        assert_eq!(renamed.choices().unwrap().keys().collect::<Vec<_>>(), ["其他", "选项2", "选项3"]);
    }

    #[test]
    fn option_delete_keeps_at_least_one() {
        let e = editor().add_question(1).unwrap();
        let q = e.form().group(1).unwrap().children[0].with_kind(QuestionKind::Choice, &[]);
        let q = q.remove_option("选项1").unwrap().remove_option("选项2").unwrap();
        assert_eq!(q.remove_option("选项3"), Err(EditError::LastOption));
    }

    #[test]
    fn hidden_reveal_only_for_depart_choices() {
        let e = editor().add_question(1).unwrap();
        let q = e.form().group(1).unwrap().children[0].with_kind(QuestionKind::Choice, &[]);
        assert_eq!(q.set_option_reveal("选项1", RevealTarget::Hidden), Err(EditError::HideNotAllowed));

        let departs = vec![Depart { id: 7, name: "秘书处".into(), created_at: None }];
        let q = q.with_kind(QuestionKind::ChoiceDepart, &departs);
        let q = q.set_option_reveal("7", RevealTarget::Hidden).unwrap();
        assert!(q.choices().unwrap().is_empty());
    }

    #[test]
    fn replace_question_validates_choice_reveals() {
        let e = editor().add_group(); // groups 1, 2
        let e = e.add_question(1).unwrap();
        let q = e.form().group(1).unwrap().children[0].with_kind(QuestionKind::Choice, &[]);
        let bad = q.set_option_reveal("选项1", RevealTarget::Group(99)).unwrap();
        assert_eq!(e.replace_question(1, 0, bad).unwrap_err(), EditError::UnknownRevealTarget(99));
        let good = q.set_option_reveal("选项1", RevealTarget::Group(2)).unwrap();
        assert!(e.replace_question(1, 0, good).is_ok());
    }
}

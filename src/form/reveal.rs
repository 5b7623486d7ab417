//! Reveal-target selection: which groups a group or choice option may
//! branch to, and the cycle policy applied when editing those edges.

use std::collections::HashSet;

use super::model::{Form, Id, QuestionBody};

/// Whether the reveal graph may contain multi-hop loops. Self-reveal is
/// rejected under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPolicy {
    /// Refuse any edit that makes the editing group reachable from its
    /// own reveal target.
    #[default]
    RejectCycles,
    /// Permit deliberate loop-backs between groups.
    AllowCycles,
}

/// A choice option's reveal value as picked in the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealTarget {
    /// The option is not offered at all; its key is absent from the map.
    Hidden,
    /// Selectable, reveals nothing (null on the wire).
    None,
    /// Selectable, reveals the given group.
    Group(Id),
}

impl RevealTarget {
    pub fn group(self) -> Option<Id> {
        match self {
            RevealTarget::Group(id) => Some(id),
            _ => None,
        }
    }
}

/// Every group offered as a candidate target when editing `this_group`:
/// all groups except the one being edited.
pub fn reveal_candidates(form: &Form, this_group: Id) -> Vec<Id> {
    form.children.iter().map(|g| g.id).filter(|&id| id != this_group).collect()
}

/// Walk the reveal graph (unconditional `next` edges plus every choice
/// option's reveal) from `start` and report whether `needle` is reachable.
pub fn reaches(form: &Form, start: Id, needle: Id) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if id == needle {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        let Some(group) = form.group(id) else { continue };
        if let Some(next) = group.next {
            stack.push(next);
        }
        for question in &group.children {
            if let QuestionBody::Choice { choices, .. }
            | QuestionBody::ChoiceDepart { choices, .. } = &question.body
            {
                stack.extend(choices.values().flatten().copied());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::model::{Question, QuestionGroup};
    use indexmap::IndexMap;

    fn form_with_edges(edges: &[(Id, Option<Id>)]) -> Form {
        Form {
            id: 1,
            name: "f".into(),
            desc: String::new(),
            create_at: None,
            start_at: None,
            end_at: None,
            children: edges
                .iter()
                .map(|&(id, next)| QuestionGroup {
                    id,
                    label: format!("问题组{}", id),
                    children: vec![],
                    next,
                })
                .collect(),
        }
    }

    #[test]
    fn candidates_exclude_self() {
        let form = form_with_edges(&[(1, None), (2, None), (3, None)]);
        assert_eq!(reveal_candidates(&form, 2), vec![1, 3]);
    }

    #[test]
    fn reaches_follows_next_chain() {
        let form = form_with_edges(&[(1, Some(2)), (2, Some(3)), (3, None)]);
        assert!(reaches(&form, 1, 3));
        assert!(!reaches(&form, 3, 1));
    }

    #[test]
    fn reaches_follows_choice_reveals() {
        let mut form = form_with_edges(&[(1, None), (2, None), (3, None)]);
        let mut choices = IndexMap::new();
        choices.insert("选项1".to_string(), Some(3));
        choices.insert("选项2".to_string(), None);
        form.children[1].children.push(Question {
            id: 1,
            title: "q".into(),
            desc: None,
            optional: None,
            body: crate::form::model::QuestionBody::Choice { choices, max_selection: None },
        });
        assert!(reaches(&form, 2, 3));
        assert!(!reaches(&form, 1, 3));
    }

    #[test]
    fn reaches_terminates_on_existing_cycle() {
        let form = form_with_edges(&[(1, Some(2)), (2, Some(1)), (3, None)]);
        assert!(!reaches(&form, 1, 3));
    }
}

use rop_console::api::FormPatch;
use rop_console::form::{Form, Question, QuestionBody, QuestionGroup};
use serde_json::json;

/// Parse the backend's detail payload and check the re-serialized tree is
/// byte-compatible in shape (tags, camelCase, absent-key semantics).
#[test]
fn form_detail_roundtrip() {
    let payload = json!({
        "id": 42,
        "name": "2024秋纳新",
        "desc": "欢迎报名",
        "startAt": 1_725_000_000,
        "children": [
            {
                "id": 1,
                "label": "问题组1",
                "children": [
                    {"id": 1, "title": "姓名", "type": "text", "maxLine": 2},
                    {
                        "id": 2,
                        "title": "部门志愿",
                        "optional": true,
                        "type": "choice-depart",
                        "choices": {"11": null, "12": 2},
                        "maxSelection": 1
                    }
                ],
                "next": 2
            },
            {"id": 2, "label": "问题组2", "children": []}
        ]
    });

    let form: Form = serde_json::from_value(payload.clone()).unwrap();
    assert_eq!(form.children.len(), 2);
    assert_eq!(form.children[0].next, Some(2));
    assert_eq!(form.children[1].next, None);

    let question = &form.children[0].children[1];
    assert!(!question.required());
    let choices = question.choices().unwrap();
    assert_eq!(choices.get("11"), Some(&None));
    assert_eq!(choices.get("12"), Some(&Some(2)));
    // "13" was never offered: absent key, not a null value.
    assert_eq!(choices.get("13"), None);

    assert_eq!(serde_json::to_value(&form).unwrap(), payload);
}

#[test]
fn unknown_question_type_is_rejected() {
    let result = serde_json::from_value::<Question>(json!({
        "id": 1,
        "title": "t",
        "type": "zjuid"
    }));
    assert!(result.is_err());
}

#[test]
fn patch_serializes_only_changed_fields() {
    let patch = serde_json::to_value(FormPatch::name("新表单名")).unwrap();
    assert_eq!(patch, json!({"name": "新表单名"}));

    let patch = serde_json::to_value(FormPatch::desc("简介")).unwrap();
    assert_eq!(patch, json!({"desc": "简介"}));
}

/// The backend takes the group tree as a JSON string inside the JSON body.
#[test]
fn patch_encodes_children_as_a_string() {
    let groups = vec![QuestionGroup {
        id: 1,
        label: "问题组1".to_string(),
        children: vec![Question {
            id: 1,
            title: "新问题".to_string(),
            desc: None,
            optional: None,
            body: QuestionBody::Text { max_line: None },
        }],
        next: None,
    }];

    let patch = serde_json::to_value(FormPatch::children(&groups).unwrap()).unwrap();
    let inner = patch["children"].as_str().expect("children must be a JSON string");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(inner).unwrap(),
        json!([{"id": 1, "label": "问题组1", "children": [{"id": 1, "title": "新问题", "type": "text"}]}])
    );
}

/// `Some(None)` clears a bound: the key is present with a null value.
#[test]
fn patch_open_window_nulls_cleared_bounds() {
    let start = chrono::DateTime::from_timestamp(1_725_000_000, 0).unwrap();
    let patch = serde_json::to_value(FormPatch::open_window(Some(start), None)).unwrap();
    assert_eq!(patch, json!({"startAt": 1_725_000_000, "endAt": null}));
}

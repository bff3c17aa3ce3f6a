//! End-to-end editor scenarios.
//!
//! Each test drives [`AccessEditor`] through public actions only:
//! - Normalization of the two documents
//! - Edit/save/export of one group
//! - Guarded transitions and rejected insertions
//! - Sorting and connection highlighting

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use access_settings::services::{Normalizer, connections_of, to_original_shape};
use access_settings::{
    AccessEditor, Action, EditMode, EntityKind, Error, Focus, GroupId, PrimaryKeys, ReportId,
    SortDirection, SourceState, UserId,
};
use serde_json::{Value, json};

fn scenario_users() -> Value {
    json!([{"email": "a@x.com", "G1": 1, "G2": 0}])
}

fn scenario_reports() -> Value {
    json!([{"link": "r1", "title": "T1", "groups": ["G1"]}])
}

fn editor() -> AccessEditor {
    let mut editor = AccessEditor::new(PrimaryKeys::default());
    editor.load(
        SourceState::ready(scenario_users()),
        SourceState::ready(scenario_reports()),
    );
    editor
}

fn sorted<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut ids: Vec<&str> = ids.collect();
    ids.sort_unstable();
    ids
}

#[test]
fn normalize_scenario() {
    let editor = editor();
    let settings = editor.settings();

    assert_eq!(sorted(settings.users().iter().map(UserId::as_str)), vec!["a@x.com"]);

    let g1 = settings.group("G1").unwrap();
    assert!(g1.has_user("a@x.com"));
    assert!(g1.has_report("r1"));
    assert!(settings.group("G2").unwrap().is_empty());

    let r1 = settings.report("r1").unwrap();
    assert_eq!(r1["title"], "T1");
    assert!(r1.get("groups").is_none());
}

#[test]
fn edit_save_and_export_scenario() {
    let mut editor = editor();
    editor
        .dispatch_all(vec![
            Action::SelectGroup { id: GroupId::from("G1") },
            Action::BeginEdit,
            Action::ToggleUser { id: UserId::from("a@x.com") },
            Action::ToggleReport { id: ReportId::from("r1") },
            Action::Save,
        ])
        .unwrap();

    assert!(editor.settings().group("G1").unwrap().is_empty());

    let bundle = editor.export();
    assert_eq!(bundle.users, vec![json!({"email": "a@x.com", "G1": null, "G2": null})]);
    assert_eq!(bundle.reports, vec![json!({"link": "r1", "title": "T1", "groups": []})]);
}

#[test]
fn begin_edit_without_active_group_is_refused() {
    let mut editor = editor();
    let err = editor.dispatch(Action::BeginEdit).unwrap_err();
    assert!(matches!(err, Error::InvalidStateTransition { .. }));
    assert_eq!(editor.selection().mode(), EditMode::Viewing);
}

#[test]
fn toggling_while_viewing_is_refused() {
    let mut editor = editor();
    editor.dispatch(Action::SelectGroup { id: GroupId::from("G1") }).unwrap();
    let err = editor
        .dispatch(Action::ToggleUser { id: UserId::from("a@x.com") })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidStateTransition { .. }));
    assert!(editor.selection().pending_user_ids().contains("a@x.com"));
}

#[test]
fn duplicate_user_is_rejected() {
    let mut editor = editor();
    for candidate in ["a@x.com", "A@X.com"] {
        let err = editor
            .dispatch(Action::AddUser { id: candidate.to_string() })
            .unwrap_err();
        assert!(err.is_identifier_rejection());
    }
    assert_eq!(editor.settings().users().len(), 1);
    assert!(!editor.is_dirty());
}

#[test]
fn sort_cycle_on_empty_list() {
    let mut editor = AccessEditor::new(PrimaryKeys::default());
    editor.load(SourceState::ready(json!([])), SourceState::ready(json!([])));

    let mut seen = Vec::new();
    for _ in 0..4 {
        let projection = editor.projection();
        assert!(projection.users.items.is_empty());
        seen.push(projection.users.sort);
        editor.dispatch(Action::CycleSort { kind: EntityKind::User }).unwrap();
    }
    assert_eq!(
        seen,
        vec![
            SortDirection::None,
            SortDirection::Ascending,
            SortDirection::Descending,
            SortDirection::None
        ]
    );
}

#[test]
fn report_focus_connection_scenario() {
    let mut editor = editor();
    editor.dispatch(Action::FocusReport { id: ReportId::from("r1") }).unwrap();

    let connections = connections_of(editor.settings(), &Focus::Report(ReportId::from("r1")));
    assert_eq!(sorted(connections.group_ids.iter().map(GroupId::as_str)), vec!["G1"]);
    assert_eq!(sorted(connections.user_ids.iter().map(UserId::as_str)), vec!["a@x.com"]);

    let projection = editor.projection();
    assert!(projection.users.items[0].highlighted);
    let groups: Vec<(&str, bool)> = projection
        .groups
        .items
        .iter()
        .map(|item| (item.id.as_str(), item.highlighted))
        .collect();
    assert_eq!(groups, vec![("G1", true), ("G2", false)]);
}

#[test]
fn cancel_twice_leaves_settings_unchanged() {
    let mut editor = editor();
    editor.dispatch(Action::SelectGroup { id: GroupId::from("G1") }).unwrap();
    editor.dispatch(Action::BeginEdit).unwrap();
    editor.dispatch(Action::ToggleUser { id: UserId::from("a@x.com") }).unwrap();
    let before = editor.settings().clone();

    editor.dispatch(Action::Cancel).unwrap();
    assert!(editor.dispatch(Action::Cancel).is_err());

    assert_eq!(editor.settings(), &before);
    assert!(editor.selection().pending_user_ids().contains("a@x.com"));
}

#[test]
fn save_then_edit_cancel_is_idempotent() {
    let mut editor = editor();
    editor
        .dispatch_all(vec![
            Action::SelectGroup { id: GroupId::from("G2") },
            Action::BeginEdit,
            Action::ToggleReport { id: ReportId::from("r1") },
            Action::Save,
        ])
        .unwrap();
    let saved = editor.settings().clone();

    editor.dispatch(Action::BeginEdit).unwrap();
    editor.dispatch(Action::Cancel).unwrap();

    assert_eq!(editor.settings(), &saved);
}

#[test]
fn groups_exist_for_every_reference() {
    let settings = Normalizer::new(PrimaryKeys::default()).normalize(
        &[json!({"email": "u", "OnlyUsers": 0})],
        &[json!({"link": "r", "groups": ["OnlyReports"]})],
    );
    assert!(settings.group("OnlyUsers").unwrap().is_empty());
    let only_reports = settings.group("OnlyReports").unwrap();
    assert!(only_reports.user_ids.is_empty());
    assert!(only_reports.has_report("r"));
}

#[test]
fn pending_edits_do_not_leak_before_save() {
    let mut editor = editor();
    editor.dispatch(Action::SelectGroup { id: GroupId::from("G2") }).unwrap();
    editor.dispatch(Action::BeginEdit).unwrap();
    editor.dispatch(Action::ToggleUser { id: UserId::from("a@x.com") }).unwrap();
    editor.dispatch(Action::ToggleAll { kind: EntityKind::Report }).unwrap();

    assert!(editor.settings().group("G2").unwrap().is_empty());
    assert!(!editor.is_dirty());
    assert_eq!(
        to_original_shape(editor.settings(), editor.keys()).users,
        vec![json!({"email": "a@x.com", "G1": 1, "G2": null})]
    );
}

#[test]
fn failed_source_degrades_to_empty() {
    let mut editor = AccessEditor::new(PrimaryKeys::default());
    editor.load(
        SourceState::failed("connection refused"),
        SourceState::ready(scenario_reports()),
    );
    assert!(editor.settings().users().is_empty());
    assert!(editor.settings().contains_report("r1"));
    assert!(editor.settings().group("G1").unwrap().has_report("r1"));
}

#[test]
fn switching_groups_cancels_edit() {
    let mut editor = editor();
    editor.dispatch(Action::SelectGroup { id: GroupId::from("G1") }).unwrap();
    editor.dispatch(Action::BeginEdit).unwrap();
    editor.dispatch(Action::ToggleUser { id: UserId::from("a@x.com") }).unwrap();

    editor.dispatch(Action::SelectGroup { id: GroupId::from("G2") }).unwrap();

    assert_eq!(editor.selection().mode(), EditMode::Viewing);
    assert!(editor.selection().pending_user_ids().is_empty());
    assert!(editor.settings().group("G1").unwrap().has_user("a@x.com"));
}

#[test]
fn unknown_members_are_refused_and_export_still_round_trips() {
    let mut editor = editor();
    editor
        .dispatch_all(vec![Action::SelectGroup { id: GroupId::from("G1") }, Action::BeginEdit])
        .unwrap();

    let ghost_user = editor.dispatch(Action::ToggleUser { id: UserId::from("ghost@x.com") });
    let ghost_report = editor.dispatch(Action::ToggleReport { id: ReportId::from("ghost-report") });
    assert!(matches!(ghost_user, Err(Error::InvalidInput(_))));
    assert!(matches!(ghost_report, Err(Error::InvalidInput(_))));

    editor.dispatch(Action::Save).unwrap();

    let g1 = editor.settings().group("G1").unwrap();
    assert!(!g1.has_user("ghost@x.com"));
    assert!(!g1.has_report("ghost-report"));
    assert!(!editor.is_dirty());

    let bundle = editor.export();
    let again = Normalizer::new(PrimaryKeys::default()).normalize(&bundle.users, &bundle.reports);
    assert_eq!(&again, editor.settings());
}

#[test]
fn focusing_unknown_user_is_refused() {
    let mut editor = editor();
    editor.dispatch(Action::SelectGroup { id: GroupId::from("G1") }).unwrap();

    let result = editor.dispatch(Action::FocusUser { id: UserId::from("ghost@x.com") });

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(editor.selection().active_group_id().map(GroupId::as_str), Some("G1"));
}

#[test]
fn group_named_like_users_key_never_reaches_export() {
    let mut editor = editor();
    assert!(editor.dispatch(Action::AddGroup { id: "email".to_string() }).is_err());

    let mut from_reports = AccessEditor::new(PrimaryKeys::default());
    from_reports.load(
        SourceState::ready(scenario_users()),
        SourceState::ready(json!([{"link": "r1", "groups": ["email", "G1"]}])),
    );

    for editor in [&editor, &from_reports] {
        let bundle = editor.export();
        assert_eq!(bundle.users[0]["email"], json!("a@x.com"));
        let again =
            Normalizer::new(PrimaryKeys::default()).normalize(&bundle.users, &bundle.reports);
        assert_eq!(&again, editor.settings());
    }
}

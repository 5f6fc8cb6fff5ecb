use registrar::domain::backup::RestoreRequest;
use registrar::domain::types::{Grade, Student, StudentNotice};
use registrar::error::RegistrarError;
use registrar::usecase::backup::{CreateBackupUseCase, RestoreBackupUseCase, RestoreSummary};
use registrar::usecase::student::{CreateStudentUseCase, StudentInput, UpdateStudentUseCase};
use registrar_domain::student::{GraduateDetails, StudentCategory};
use registrar_domain::user::UserRole;
use registrar_events::{EventBus, StudentChange};
use registrar_testing::fixture::Fixture;
use serde_json::json;

use crate::helpers::{MockStudentRepo, MockUserRepo, at, recording_bus, test_student, test_user};

fn graduate_with_grades() -> Student {
    let mut ana = test_student(4, "S100", "Ana", "Cruz");
    ana.category = StudentCategory::Graduate;
    ana.graduate.lrn = Some("123456789012".into());
    ana.grade_level = Some("Grade 12".into());
    ana.attachments = vec!["/uploads/form137.pdf".into()];
    ana.updated_at = at(5);
    ana.grades = vec![
        Grade {
            id: 1,
            student_id: 4,
            subject: "Mathematics".into(),
            grade: "92".into(),
        },
        Grade {
            id: 2,
            student_id: 4,
            subject: "Science".into(),
            grade: "89".into(),
        },
    ];
    ana
}

fn school() -> (MockUserRepo, MockStudentRepo) {
    let users = MockUserRepo::new(vec![
        test_user(1, "admin", UserRole::Admin),
        test_user(2, "registrar", UserRole::User),
    ]);
    let students = MockStudentRepo::new(vec![
        test_student(2, "S101", "Ben", "Lim"),
        graduate_with_grades(),
    ]);
    (users, students)
}

fn cara() -> StudentInput {
    StudentInput {
        username: "S102".into(),
        first_name: "Cara".into(),
        middle_name: String::new(),
        last_name: "Santos".into(),
        category: StudentCategory::Active,
        attachments: vec![],
        grade_level: None,
        graduate: GraduateDetails::default(),
        grades: None,
    }
}

/// Drop storage-assigned grade ids so that restored rows compare equal.
fn without_grade_ids(students: Vec<Student>) -> Vec<(Student, Vec<(String, String)>)> {
    students
        .into_iter()
        .map(|mut s| {
            let grades = s
                .grades
                .drain(..)
                .map(|g| (g.subject, g.grade))
                .collect();
            (s, grades)
        })
        .collect()
}

fn restore_into(students: MockStudentRepo) -> RestoreBackupUseCase<MockStudentRepo> {
    RestoreBackupUseCase {
        students,
        events: EventBus::new(),
    }
}

async fn snapshot_json(users: MockUserRepo, students: MockStudentRepo) -> serde_json::Value {
    let snapshot = CreateBackupUseCase { users, students }
        .execute()
        .await
        .unwrap();
    serde_json::to_value(snapshot).unwrap()
}

// ── CreateBackupUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_export_all_users_and_students_with_grades() {
    let (users, students) = school();

    let json = snapshot_json(users, students).await;

    assert_eq!(json["version"], "1.0");
    assert!(json["timestamp"].is_string());
    let users = json["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["password"], "hashed:admin-pass");
    assert_eq!(users[0]["role"], "admin");
    let students = json["data"]["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[1]["id"], 4);
    assert_eq!(students[1]["lrn"], "123456789012");
    assert_eq!(students[1]["grades"].as_array().unwrap().len(), 2);
    assert_eq!(students[0]["grades"], json!([]));
}

// ── RestoreBackupUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_restore_students_exactly_as_backed_up() {
    let (users, students) = school();
    let original = students.snapshot();
    let json = snapshot_json(users, students).await;

    let target = MockStudentRepo::new(vec![test_student(9, "S900", "Old", "Row")]);
    let store = target.share();
    let summary = restore_into(target)
        .execute(serde_json::from_value(json).unwrap())
        .await
        .unwrap();

    assert_eq!(
        summary,
        RestoreSummary {
            removed: 1,
            restored: 2,
        }
    );
    assert_eq!(without_grade_ids(store.snapshot()), without_grade_ids(original));
    assert_eq!(store.sequence_syncs(), 1);
}

#[tokio::test]
async fn should_reproduce_timestamps_written_through_the_service() {
    let source = MockStudentRepo::empty();
    let (events, _log) = recording_bus();
    let created = CreateStudentUseCase {
        repo: source.share(),
        events: events.clone(),
    }
    .execute(1, cara())
    .await
    .unwrap();
    UpdateStudentUseCase {
        repo: source.share(),
        events,
    }
    .execute(created.id, cara())
    .await
    .unwrap();
    let original = source.snapshot();
    let json = snapshot_json(MockUserRepo::empty(), source).await;

    let target = MockStudentRepo::empty();
    let store = target.share();
    restore_into(target)
        .execute(serde_json::from_value(json).unwrap())
        .await
        .unwrap();

    let restored = store.snapshot();
    assert_eq!(restored[0].created_at, original[0].created_at);
    assert_eq!(restored[0].updated_at, original[0].updated_at);
    assert!(restored[0].updated_at > restored[0].created_at);
}

#[tokio::test]
async fn should_drop_sub_millisecond_digits_from_restored_timestamps() {
    let mut ana = test_student(3, "S100", "Ana", "Cruz");
    ana.created_at = at(2) + chrono::Duration::microseconds(123_456);
    ana.updated_at = ana.created_at;
    let json = snapshot_json(MockUserRepo::empty(), MockStudentRepo::new(vec![ana])).await;
    assert_eq!(json["data"]["students"][0]["created_at"], "2025-01-02T08:00:00.123Z");

    let target = MockStudentRepo::empty();
    let store = target.share();
    restore_into(target)
        .execute(serde_json::from_value(json.clone()).unwrap())
        .await
        .unwrap();
    let again = snapshot_json(MockUserRepo::empty(), store).await;

    assert_eq!(
        again["data"]["students"][0]["created_at"],
        json["data"]["students"][0]["created_at"]
    );
    assert_eq!(again["data"]["students"], json["data"]["students"]);
}

#[tokio::test]
async fn should_publish_removals_and_recreations() {
    let target = MockStudentRepo::new(vec![
        test_student(7, "S107", "Old", "Row"),
        test_student(8, "S108", "Old", "Row"),
    ]);
    let (events, log) = recording_bus();
    let request: RestoreRequest =
        serde_json::from_value(Fixture::load("fixtures/backup/legacy_v1.json")).unwrap();

    RestoreBackupUseCase {
        students: target,
        events,
    }
    .execute(request)
    .await
    .unwrap();

    let log = log.lock().unwrap();
    let seen: Vec<(StudentChange, i32)> = log
        .iter()
        .map(|(change, notice)| (*change, notice.student_id()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (StudentChange::Deleted, 7),
            (StudentChange::Deleted, 8),
            (StudentChange::Created, 14),
            (StudentChange::Created, 15),
        ]
    );
    assert!(matches!(log[2].1, StudentNotice::Saved(ref s) if s.title == "Ana Cruz (S100)"));
}

#[tokio::test]
async fn should_empty_students_when_backup_has_none() {
    let target = MockStudentRepo::new(vec![test_student(1, "S100", "Ana", "Cruz")]);
    let store = target.share();
    let request: RestoreRequest =
        serde_json::from_value(json!({ "version": "1.0", "data": { "users": [], "students": [] } }))
            .unwrap();

    let summary = restore_into(target)
        .execute(request)
        .await
        .unwrap();

    assert_eq!(summary.restored, 0);
    assert_eq!(summary.removed, 1);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn should_reject_malformed_backup_without_touching_students() {
    let cases = [
        (json!({}), "missing data"),
        (json!({ "data": { "students": [] } }), "missing data.users"),
        (json!({ "data": { "users": [] } }), "missing data.students"),
    ];
    for (body, reason) in cases {
        let target = MockStudentRepo::new(vec![test_student(1, "S100", "Ana", "Cruz")]);
        let store = target.share();

        let result = restore_into(target)
            .execute(serde_json::from_value(body).unwrap())
            .await;

        assert!(
            matches!(result, Err(RegistrarError::InvalidBackup(r)) if r == reason),
            "expected InvalidBackup({reason}), got {result:?}"
        );
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.sequence_syncs(), 0);
    }
}

#[tokio::test]
async fn should_reject_unknown_backup_version() {
    let target = MockStudentRepo::new(vec![test_student(1, "S100", "Ana", "Cruz")]);
    let store = target.share();
    let request: RestoreRequest =
        serde_json::from_value(json!({ "version": "2.0", "data": { "users": [], "students": [] } }))
            .unwrap();

    let result = restore_into(target)
        .execute(request)
        .await;

    assert!(
        matches!(result, Err(RegistrarError::UnsupportedBackupVersion(ref v)) if v == "2.0"),
        "got {result:?}"
    );
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn should_report_partial_restore_and_still_resync_ids() {
    let target = MockStudentRepo::new(vec![test_student(1, "S100", "Ana", "Cruz")]).failing_at(1);
    let store = target.share();
    let rows: Vec<_> = [(10, "S110", "Cara"), (11, "S111", "Dan"), (12, "S112", "Eve")]
        .into_iter()
        .map(|(id, username, first)| {
            json!({
                "id": id,
                "username": username,
                "category": "Active",
                "first_name": first,
                "last_name": "Ramos",
                "owner_id": 1,
                "created_at": "2025-01-10T03:00:00.000Z",
                "updated_at": "2025-01-10T03:00:00.000Z",
            })
        })
        .collect();
    let request: RestoreRequest =
        serde_json::from_value(json!({ "data": { "users": [], "students": rows } })).unwrap();

    let result = restore_into(target)
        .execute(request)
        .await;

    match result {
        Err(RegistrarError::PartialRestore {
            restored, total, ..
        }) => {
            assert_eq!(restored, 1);
            assert_eq!(total, 3);
        }
        other => panic!("expected PartialRestore, got {other:?}"),
    }
    let ids: Vec<i32> = store.snapshot().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![10]);
    assert_eq!(store.sequence_syncs(), 1);
}

#[tokio::test]
async fn should_restore_backup_written_by_earlier_release() {
    let request: RestoreRequest =
        serde_json::from_value(Fixture::load("fixtures/backup/legacy_v1.json")).unwrap();
    let target = MockStudentRepo::empty();
    let store = target.share();

    let summary = restore_into(target)
        .execute(request)
        .await
        .unwrap();

    assert_eq!(summary.restored, 2);
    let students = store.snapshot();
    let ana = &students[0];
    assert_eq!(ana.id, 14);
    assert_eq!(ana.title, "Ana Cruz (S100)");
    assert_eq!(ana.category, StudentCategory::Graduate);
    assert_eq!(ana.graduate.so_number.as_deref(), Some("SO-2024-118"));
    assert_eq!(ana.attachments.len(), 1);
    let subjects: Vec<&str> = ana.grades.iter().map(|g| g.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Mathematics", "Science"]);
    assert!(ana.grades.iter().all(|g| g.student_id == 14));
    assert_eq!(students[1].id, 15);
    assert_eq!(students[1].graduate, GraduateDetails::default());
}

#[tokio::test]
async fn should_continue_id_sequence_after_restored_rows() {
    let request: RestoreRequest =
        serde_json::from_value(Fixture::load("fixtures/backup/legacy_v1.json")).unwrap();
    let target = MockStudentRepo::empty();
    let store = target.share();
    restore_into(target)
        .execute(request)
        .await
        .unwrap();
    let (events, _log) = recording_bus();

    let created = CreateStudentUseCase {
        repo: store,
        events,
    }
    .execute(2, cara())
    .await
    .unwrap();

    assert_eq!(created.id, 16);
}

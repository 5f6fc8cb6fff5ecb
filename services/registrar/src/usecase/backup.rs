use chrono::Utc;

use registrar_events::{EventBus, StudentChange};

use crate::domain::backup::{
    RestoreRequest, SNAPSHOT_VERSION, Snapshot, SnapshotData, SnapshotStudent, SnapshotUser,
};
use crate::domain::repository::{StudentRepository, UserRepository};
use crate::domain::types::StudentNotice;
use crate::error::RegistrarError;
use crate::usecase::student::publish;

// ── CreateBackup ─────────────────────────────────────────────────────────────

/// Read-only export of every account and every student with grades.
pub struct CreateBackupUseCase<U: UserRepository, S: StudentRepository> {
    pub users: U,
    pub students: S,
}

impl<U: UserRepository, S: StudentRepository> CreateBackupUseCase<U, S> {
    pub async fn execute(&self) -> Result<Snapshot, RegistrarError> {
        let users = self.users.list().await?;
        let students = self.students.list_all().await?;
        tracing::info!(
            users = users.len(),
            students = students.len(),
            "backup snapshot created"
        );
        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            timestamp: Utc::now(),
            data: SnapshotData {
                users: users.into_iter().map(SnapshotUser::from).collect(),
                students: students.into_iter().map(SnapshotStudent::from).collect(),
            },
        })
    }
}

// ── RestoreBackup ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub removed: u64,
    pub restored: usize,
}

/// Replace every student with the snapshot's students. Accounts are left alone.
///
/// Each student is inserted in its own transaction. When one fails, the
/// students already recreated stay and the error reports how far it got.
/// Subscribers see a `student:deleted` for every removed row and a
/// `student:created` for every row recreated, including on partial failure.
pub struct RestoreBackupUseCase<S: StudentRepository> {
    pub students: S,
    pub events: EventBus<StudentNotice>,
}

impl<S: StudentRepository> RestoreBackupUseCase<S> {
    pub async fn execute(&self, request: RestoreRequest) -> Result<RestoreSummary, RegistrarError> {
        let data = request
            .data
            .ok_or(RegistrarError::InvalidBackup("missing data"))?;
        if data.users.is_none() {
            return Err(RegistrarError::InvalidBackup("missing data.users"));
        }
        let students = data
            .students
            .ok_or(RegistrarError::InvalidBackup("missing data.students"))?;
        if let Some(version) = request.version {
            if version != SNAPSHOT_VERSION {
                return Err(RegistrarError::UnsupportedBackupVersion(version));
            }
        }

        let total = students.len();
        let removed_ids = self.students.delete_all().await?;
        let removed = removed_ids.len() as u64;
        tracing::info!(removed, total, "restoring students from backup");
        for id in removed_ids {
            publish(&self.events, StudentChange::Deleted, StudentNotice::Removed { id });
        }

        let mut restored = 0;
        let mut failure = None;
        for student in students {
            let student_id = student.id;
            match self.students.insert(&student.into_new_student()).await {
                Ok(student) => {
                    restored += 1;
                    publish(&self.events, StudentChange::Created, StudentNotice::Saved(student));
                }
                Err(e) => {
                    tracing::error!(student_id, restored, total, error = ?e, "restoring student failed");
                    failure = Some(e);
                    break;
                }
            }
        }

        let synced = self.students.sync_id_sequence().await;
        if let Some(source) = failure {
            if let Err(e) = synced {
                tracing::error!(error = ?e, "id sequence not resynchronized after failed restore");
            }
            return Err(RegistrarError::PartialRestore {
                restored,
                total,
                source: Box::new(source),
            });
        }
        synced?;
        tracing::info!(restored, "restore complete");
        Ok(RestoreSummary { removed, restored })
    }
}

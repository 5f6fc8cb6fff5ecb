//! Student record domain types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// Enrollment status of a student record.
///
/// Wire and storage format: `"Active"`, `"Graduate"`, `"Inactive"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StudentCategory {
    Active,
    Graduate,
    Inactive,
}

impl StudentCategory {
    pub const ALL: [Self; 3] = [Self::Active, Self::Graduate, Self::Inactive];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Graduate => "Graduate",
            Self::Inactive => "Inactive",
        }
    }
}

impl FromStr for StudentCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "student category",
                value: s.to_owned(),
            })
    }
}

/// Display label stored alongside every student: `"First Last (ID)"`.
pub fn student_title(first_name: &str, last_name: &str, username: &str) -> String {
    format!("{first_name} {last_name} ({username})")
}

/// Fields that only carry meaning for graduates.
///
/// Always stored; every field is `None` unless the category is `Graduate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraduateDetails {
    pub last_school_year: Option<String>,
    pub contact_number: Option<String>,
    pub so_number: Option<String>,
    pub date_issued: Option<String>,
    pub series_year: Option<String>,
    pub lrn: Option<String>,
}

impl GraduateDetails {
    /// Apply the storage policy: keep the details for graduates, null them otherwise.
    pub fn for_category(self, category: StudentCategory) -> Self {
        match category {
            StudentCategory::Graduate => self,
            StudentCategory::Active | StudentCategory::Inactive => Self::default(),
        }
    }
}

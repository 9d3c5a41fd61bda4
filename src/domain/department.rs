use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Department value object: the closed set of complaint categories.
///
/// A complaint's category doubles as the routing key to the department
/// admins responsible for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    Academic,
    Hostel,
    Library,
    Canteen,
    Infrastructure,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::Academic,
        Department::Hostel,
        Department::Library,
        Department::Canteen,
        Department::Infrastructure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Academic => "Academic",
            Department::Hostel => "Hostel",
            Department::Library => "Library",
            Department::Canteen => "Canteen",
            Department::Infrastructure => "Infrastructure",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown department: {0}")]
pub struct UnknownDepartment(pub String);

impl FromStr for Department {
    type Err = UnknownDepartment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| UnknownDepartment(s.to_string()))
    }
}

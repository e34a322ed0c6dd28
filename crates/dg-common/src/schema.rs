//! Logical row schema and versioning.
//!
//! The column set is what every sink must accept and what the read side
//! queries. Names are kept stable so existing tables and charts keep
//! working across releases.

/// Current schema version for rows and JSON outputs.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (column removals, type changes)
/// - MINOR: Additive changes (new optional columns)
/// - PATCH: Bug fixes, documentation
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Table (or file stem) rows are written to.
pub const TABLE_NAME: &str = "CosineTest2";

/// Columns of the logical row schema, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    InsertionTime,
    StartingOrSeedAngle,
    AngleRotation,
    CurrentAngle,
    CosineOfCurrentAngle,
    TimeOfCosineOfCurrentAngle,
    IntervalAtWhichCosineIsTaken,
}

/// All columns in storage order.
pub const COLUMNS: [Column; 7] = [
    Column::InsertionTime,
    Column::StartingOrSeedAngle,
    Column::AngleRotation,
    Column::CurrentAngle,
    Column::CosineOfCurrentAngle,
    Column::TimeOfCosineOfCurrentAngle,
    Column::IntervalAtWhichCosineIsTaken,
];

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::InsertionTime => "InsertionTime",
            Column::StartingOrSeedAngle => "StartingOrSeedAngle",
            Column::AngleRotation => "AngleRotation",
            Column::CurrentAngle => "CurrentAngle",
            Column::CosineOfCurrentAngle => "CosineOfCurrentAngle",
            Column::TimeOfCosineOfCurrentAngle => "TimeOfCosineOfCurrentAngle",
            Column::IntervalAtWhichCosineIsTaken => "IntervalAtWhichCosineIsTaken",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_in_storage_order() {
        let names: Vec<&str> = COLUMNS.iter().map(|c| c.name()).collect();
        assert_eq!(names.first(), Some(&"InsertionTime"));
        assert_eq!(names.last(), Some(&"IntervalAtWhichCosineIsTaken"));
        assert_eq!(names.len(), 7);
    }
}

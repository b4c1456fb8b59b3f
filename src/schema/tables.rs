//! Table definitions for the job store

use super::types::*;

/// Maintenance jobs, seeded once at setup
pub static JOBLIST: TableSchema = TableSchema {
    name: "joblist",
    columns: &[
        Column::new("job_id", ColumnType::Integer).primary_key(),
        Column::required("due_date", ColumnType::Text),
        Column::required("job_title", ColumnType::Text),
        Column::required("vessel_name", ColumnType::Text),
        Column::required("component", ColumnType::Text),
        Column::required("maker", ColumnType::Text),
        Column::required("model", ColumnType::Text),
    ],
};

/// Maker/model register per vessel function, bulk-loaded from CSV
pub static MAKERMODELS: TableSchema = TableSchema {
    name: "makermodels",
    columns: &[
        Column::required("func_no", ColumnType::Text),
        Column::required("func_desc", ColumnType::Text),
        Column::required("vessel_code", ColumnType::Text),
        Column::required("vessel_name", ColumnType::Text),
        Column::required("maker", ColumnType::Text),
        Column::new("model", ColumnType::Text),
    ],
};

/// Open work orders, bulk-loaded from CSV
pub static WORKORDERS: TableSchema = TableSchema {
    name: "workorders",
    columns: &[
        Column::required("job_title", ColumnType::Text),
        Column::required("vessel_code", ColumnType::Text),
        Column::required("func_no", ColumnType::Text),
        Column::required("func_desc", ColumnType::Text),
        Column::required("due_date", ColumnType::Text),
    ],
};

pub static ALL_TABLES: &[&TableSchema] = &[&JOBLIST, &MAKERMODELS, &WORKORDERS];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_table() {
        assert_eq!(get_table("joblist").unwrap().name, "joblist");
        assert!(get_table("nonexistent").is_none());
    }

    #[test]
    fn test_only_makermodels_model_is_nullable() {
        for table in ALL_TABLES {
            for col in table.columns {
                let expected = (table.name == "makermodels" && col.name == "model")
                    || col.primary_key;
                assert_eq!(col.nullable, expected, "{}.{}", table.name, col.name);
            }
        }
    }
}

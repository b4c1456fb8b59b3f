use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::record::SqlValue;
use crate::error::Result;
use crate::schema::ColumnType;

/// A fully parsed CSV source, with column types inferred
#[derive(Debug, Clone, PartialEq)]
pub struct Tabular {
    pub headers: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Tabular {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse CSV with a header row. Every record must have as many fields
    /// as the header; a ragged record fails the whole parse.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            raw_rows.push(record.iter().map(str::to_string).collect());
        }

        let column_types: Vec<ColumnType> = (0..headers.len())
            .map(|idx| infer_column_type(raw_rows.iter().map(|row| row[idx].as_str())))
            .collect();

        let rows = raw_rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&column_types)
                    .map(|(cell, col_type)| convert_cell(cell, col_type))
                    .collect()
            })
            .collect();

        Ok(Self {
            headers,
            column_types,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pick the narrowest type every non-empty cell in a column fits
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut col_type = ColumnType::Integer;

    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        match col_type {
            ColumnType::Integer if cell.parse::<i64>().is_ok() => {}
            ColumnType::Integer | ColumnType::Real if cell.parse::<f64>().is_ok() => {
                col_type = ColumnType::Real;
            }
            _ => return ColumnType::Text,
        }
    }

    col_type
}

fn convert_cell(cell: &str, col_type: &ColumnType) -> SqlValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return SqlValue::Null;
    }

    match col_type {
        ColumnType::Integer => trimmed
            .parse()
            .map(SqlValue::Integer)
            .unwrap_or_else(|_| SqlValue::Text(cell.to_string())),
        ColumnType::Real => trimmed
            .parse()
            .map(SqlValue::Real)
            .unwrap_or_else(|_| SqlValue::Text(cell.to_string())),
        ColumnType::Text => SqlValue::Text(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_column_type() {
        assert_eq!(infer_column_type(["1", "2", ""].into_iter()), ColumnType::Integer);
        assert_eq!(infer_column_type(["1", "2.5"].into_iter()), ColumnType::Real);
        assert_eq!(infer_column_type(["1", "S 937"].into_iter()), ColumnType::Text);
        assert_eq!(infer_column_type(["", ""].into_iter()), ColumnType::Integer);
    }

    #[test]
    fn test_parse_with_inferred_types() {
        let data = "func_no,func_desc,model\n601.001,HFO purifier 1,S 937\n601.002,HFO purifier 2,\n";
        let tabular = Tabular::from_reader(data.as_bytes()).unwrap();

        assert_eq!(tabular.headers, ["func_no", "func_desc", "model"]);
        assert_eq!(
            tabular.column_types,
            [ColumnType::Real, ColumnType::Text, ColumnType::Text]
        );
        assert_eq!(tabular.rows[0][0], SqlValue::Real(601.001));
        assert_eq!(tabular.rows[1][2], SqlValue::Null);
    }

    #[test]
    fn test_ragged_row_fails() {
        let data = "a,b\n1,2\n3\n";
        assert!(Tabular::from_reader(data.as_bytes()).is_err());
    }
}

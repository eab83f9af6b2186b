// 📂 Loader - delimited file → raw typed table
// Only flat CSV with a header row is supported.

use crate::error::{PipelineError, PipelineResult};
use crate::table::{Table, TableRole};
use csv::ReaderBuilder;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load a CSV file for the given role.
pub fn load_table(path: &Path, role: TableRole) -> PipelineResult<Table> {
    let file = File::open(path).map_err(|e| PipelineError::file(path, e))?;
    let table = read_table(file, role)?;

    debug!(
        "loaded {} from {}: {} rows × {} cols",
        role,
        path.display(),
        table.row_count(),
        table.column_count()
    );

    Ok(table)
}

/// Read CSV from any reader. Column types are inferred after every
/// record has been read, so a late non-numeric cell demotes the column.
pub fn read_table<R: Read>(input: R, role: TableRole) -> PipelineResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Table::from_text(role.name(), &headers, &records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnType, Value};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_table_infers_types() {
        let csv = "id,date,client_id,card_id,amount,use_chip,mcc\n\
                   7475327,2010-01-01 00:01:00,1556,2972,$-77.00,Swipe Transaction,5499\n\
                   7475328,2010-01-01 00:02:00,561,4575,$14.57,Swipe Transaction,5311\n";
        let table = read_table(csv.as_bytes(), TableRole::Transactions).unwrap();

        assert_eq!(table.name, "transactions");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 7);
        assert_eq!(table.columns[0].column_type, ColumnType::Integer);
        assert_eq!(table.columns[4].column_type, ColumnType::Text);
        assert_eq!(table.rows[1][6], Value::Integer(5311));
    }

    #[test]
    fn test_header_only_file_is_empty_table() {
        let table = read_table("id,gender,current_age\n".as_bytes(), TableRole::Users).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_names(), vec!["id", "gender", "current_age"]);
    }

    #[test]
    fn test_ragged_record_is_csv_error() {
        let result = read_table("id,gender\n1,Male,extra\n".as_bytes(), TableRole::Users);
        assert!(matches!(result, Err(PipelineError::Csv(_))));
    }

    #[test]
    fn test_load_table_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_table(&dir.path().join("nope.csv"), TableRole::Cards);
        assert!(matches!(result, Err(PipelineError::File { .. })));
    }

    #[test]
    fn test_load_table_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards_data.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,client_id,card_brand,card_type").unwrap();
        writeln!(file, "4524,825,Visa,Debit").unwrap();

        let table = load_table(&path, TableRole::Cards).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][2], Value::Text("Visa".to_string()));
    }
}

// 💾 Report Writer - one CSV per aggregate result

use crate::error::{PipelineError, PipelineResult};
use crate::table::Table;
use csv::Writer;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serialize a table with a header row. Missing cells become empty fields.
pub fn write_table<W: Write>(table: &Table, out: W) -> PipelineResult<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(table.column_names())?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write every result to `<out_dir>/<name>.csv`, creating the directory.
pub fn save_query_results(results: &[Table], out_dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| PipelineError::file(out_dir, e))?;

    let mut written = Vec::with_capacity(results.len());
    for table in results {
        let path = out_dir.join(format!("{}.csv", table.name));
        let file = fs::File::create(&path).map_err(|e| PipelineError::file(&path, e))?;
        write_table(table, file)?;
        debug!("wrote {} ({} rows)", path.display(), table.row_count());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType, Value};
    use tempfile::TempDir;

    fn avg_by_brand() -> Table {
        let mut table = Table::new(
            "avg_txn_amount_by_brand",
            vec![
                Column::new("card_brand", ColumnType::Text),
                Column::new("avg_amount", ColumnType::Real),
            ],
        );
        table
            .push_row(vec![Value::Text("Amex".to_string()), Value::Real(61.25)])
            .unwrap();
        table
            .push_row(vec![Value::Null, Value::Real(-3.5)])
            .unwrap();
        table
    }

    #[test]
    fn test_write_table_format() {
        let mut buf = Vec::new();
        write_table(&avg_by_brand(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "card_brand,avg_amount\nAmex,61.25\n,-3.5\n"
        );
    }

    #[test]
    fn test_quotes_fields_with_delimiters() {
        let mut table = Table::new("t", vec![Column::new("label", ColumnType::Text)]);
        table
            .push_row(vec![Value::Text("a, b".to_string())])
            .unwrap();
        let mut buf = Vec::new();
        write_table(&table, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "label\n\"a, b\"\n");
    }

    #[test]
    fn test_save_query_results_creates_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("results").join("nested");

        let written = save_query_results(&[avg_by_brand()], &out).unwrap();

        assert_eq!(written, vec![out.join("avg_txn_amount_by_brand.csv")]);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("card_brand,avg_amount\n"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_is_csv_error() {
        let err = write_table(&avg_by_brand(), BrokenPipe).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(_)));
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let table = Table::new(
            "gender_distribution",
            vec![
                Column::new("gender", ColumnType::Text),
                Column::new("num_users", ColumnType::Integer),
            ],
        );
        let mut buf = Vec::new();
        write_table(&table, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "gender,num_users\n");
    }
}

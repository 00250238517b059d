use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::debug;

use crate::error::Result;
use crate::models::{RawTable, RawTransaction};

/// Read a whole CSV file into memory. Column presence is checked later by
/// `pipeline::load_and_enrich`; columns the pipeline does not use are ignored.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let table = read_table_from(file)?;
    debug!("read {} rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn read_table_from<R: Read>(source: R) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|column| column.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawTransaction>() {
        rows.push(result?);
    }

    Ok(RawTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = "\
order_id,order_date,category,region,payment_method,quantity,price,discount,customer
1001,2024-01-05,Books,North,card,2,10.0,0.1,ana
1002, 2024-02-10 ,Toys,South,cash,1,20,,ben
";

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let table = read_table_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("customer"));
        assert_eq!(
            table.rows[0],
            RawTransaction {
                order_id: Some("1001".to_string()),
                order_date: Some("2024-01-05".to_string()),
                category: Some("Books".to_string()),
                region: Some("North".to_string()),
                payment_method: Some("card".to_string()),
                quantity: Some("2".to_string()),
                price: Some("10.0".to_string()),
                discount: Some("0.1".to_string()),
            }
        );
    }

    #[test]
    fn trims_cells_and_maps_empty_to_none() {
        let table = read_table_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.rows[1].order_date.as_deref(), Some("2024-02-10"));
        assert_eq!(table.rows[1].discount, None);
    }

    #[test]
    fn missing_columns_still_load_as_empty_cells() {
        let table = read_table_from("order_id,quantity\n7,3\n".as_bytes()).unwrap();
        assert!(!table.has_column("price"));
        assert_eq!(table.rows[0].price, None);
        assert_eq!(table.rows[0].quantity.as_deref(), Some("3"));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let table = read_table_from(
            "order_id,order_date,category,region,payment_method,quantity,price,discount\n".as_bytes(),
        )
        .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 8);
    }

    #[test]
    fn reads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let table = read_table(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Io(_)));
    }
}

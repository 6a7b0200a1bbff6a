use std::io::{Cursor, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use tabula_frame::{ColumnType, Value};
use tabula_io::{read_delimited, read_path, CsvError, CsvOptions};

#[test]
fn header_kinds_and_nulls() {
    let input = "name,age,weight,alive\nMax,23,55.5,true\nAnna,NA,,FALSE\nHorst,12,82,true\n";
    let table = read_delimited(Cursor::new(input), &CsvOptions::default()).unwrap();

    assert_eq!(table.names(), vec!["name", "age", "weight", "alive"]);
    let kinds: Vec<ColumnType> = table.columns().iter().map(|c| c.column_type()).collect();
    assert_eq!(
        kinds,
        vec![
            ColumnType::String,
            ColumnType::Int,
            ColumnType::Double,
            ColumnType::Boolean
        ]
    );
    assert_eq!(table.value(1, "age").unwrap(), Value::Null);
    assert_eq!(table.value(1, "weight").unwrap(), Value::Null);
    assert_eq!(table.value(1, "alive").unwrap(), Value::Boolean(false));
    assert_eq!(table.value(2, "weight").unwrap(), Value::Double(82.0));
}

#[test]
fn ragged_rows_and_missing_header_names() {
    let input = "a,,c\n1,2\n3,4,5,6\n";
    let table = read_delimited(Cursor::new(input), &CsvOptions::csv()).unwrap();
    assert_eq!(table.names(), vec!["a", "Column2", "c", "Column4"]);
    assert_eq!(table.nrow(), 2);
    assert_eq!(table.value(0, "c").unwrap(), Value::Null);
    assert_eq!(table.value(1, "Column4").unwrap(), Value::Int(6));
}

#[test]
fn headerless_tab_separated_input() {
    let options = CsvOptions {
        has_header: false,
        ..CsvOptions::tsv()
    };
    let table = read_delimited(Cursor::new("x\t1\ny\t2\n"), &options).unwrap();
    assert_eq!(table.names(), vec!["Column1", "Column2"]);
    assert_eq!(table.column("Column2").unwrap().column_type(), ColumnType::Int);
}

#[test]
fn custom_null_tokens_and_untrimmed_fields() {
    let options = CsvOptions {
        null_tokens: vec!["-".to_string()],
        trim: false,
        ..CsvOptions::default()
    };
    let table = read_delimited(Cursor::new("s\n a \n-\n"), &options).unwrap();
    assert_eq!(table.nrow(), 2);
    assert_eq!(table.value(0, "s").unwrap(), Value::from(" a "));
    assert_eq!(table.value(1, "s").unwrap(), Value::Null);
}

#[test]
fn empty_inputs() {
    let table = read_delimited(Cursor::new(""), &CsvOptions::default()).unwrap();
    assert_eq!((table.nrow(), table.ncol()), (0, 0));

    let table = read_delimited(Cursor::new("a,b\n"), &CsvOptions::default()).unwrap();
    assert_eq!((table.nrow(), table.ncol()), (0, 2));
}

#[test]
fn gzip_input_is_decompressed() {
    let file = tempfile::Builder::new().suffix(".tsv.gz").tempfile().unwrap();
    let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
    write!(encoder, "carrier\tdep_delay\nUA\t2\nAA\tNA\nUA\t-4\n").unwrap();
    encoder.finish().unwrap().flush().unwrap();

    let options = CsvOptions::for_path(file.path());
    assert_eq!(options.delimiter, b'\t');
    let table = read_path(file.path(), &options).unwrap();
    assert_eq!(table.names(), vec!["carrier", "dep_delay"]);
    assert_eq!(table.nrow(), 3);
    assert_eq!(table.column("dep_delay").unwrap().column_type(), ColumnType::Int);
    assert_eq!(table.value(1, "dep_delay").unwrap(), Value::Null);
    assert_eq!(table.value(2, "dep_delay").unwrap(), Value::Int(-4));
}

#[test]
fn repeated_header_names_are_made_unique() {
    let input = "a,a,b,a_2\n1,2,3,4\n";
    let table = read_delimited(Cursor::new(input), &CsvOptions::default()).unwrap();
    assert_eq!(table.names(), vec!["a", "a_3", "b", "a_2"]);
    assert_eq!(table.value(0, "a_3").unwrap(), Value::Int(2));

    let table = read_delimited(Cursor::new("x,,x\n1,2,3\n"), &CsvOptions::default()).unwrap();
    assert_eq!(table.names(), vec!["x", "Column2", "x_2"]);
}

#[test]
fn read_path_uses_the_file_contents() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    writeln!(file, "k\tv").unwrap();
    writeln!(file, "a\t1.5").unwrap();
    file.flush().unwrap();

    let options = CsvOptions::for_path(file.path());
    let table = read_path(file.path(), &options).unwrap();
    assert_eq!(table.value(0, "v").unwrap(), Value::Double(1.5));

    let missing = read_path(file.path().with_extension("missing"), &options).unwrap_err();
    assert!(matches!(missing, CsvError::Io(_)));
}

#[test]
fn sampling_falls_back_to_strings_for_late_outliers() {
    let options = CsvOptions {
        sample_rows: Some(2),
        ..CsvOptions::default()
    };
    let table = read_delimited(Cursor::new("n\n1\n2\nthree\n"), &options).unwrap();
    assert_eq!(table.column("n").unwrap().column_type(), ColumnType::String);
}

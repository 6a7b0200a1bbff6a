use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::ByteRecord;
use flate2::bufread::MultiGzDecoder;
use tabula_frame::{Column, ColumnType, FrameError, Table, Value};
use thiserror::Error;

/// First two bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// Field texts read as null (compared after trimming when `trim` is set).
    pub null_tokens: Vec<String>,
    /// Rows used to infer column kinds; `None` inspects every row.
    pub sample_rows: Option<usize>,
    /// Strip surrounding whitespace from every field.
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            null_tokens: vec![String::new(), "NA".to_string()],
            sample_rows: None,
            trim: true,
        }
    }
}

impl CsvOptions {
    pub fn csv() -> Self {
        Self::default()
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }

    /// Options for a file, picking the delimiter from its extension. A trailing `.gz` is looked
    /// through, so `flights.tsv.gz` reads as tab-separated.
    pub fn for_path(path: &Path) -> Self {
        let lower = |p: &Path| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
        };
        let ext = match lower(path).as_deref() {
            Some("gz") => path.file_stem().and_then(|stem| lower(Path::new(stem))),
            _ => lower(path),
        };
        match ext.as_deref() {
            Some("tsv" | "tab" | "txt") => Self::tsv(),
            _ => Self::csv(),
        }
    }

    fn is_null(&self, field: &str) -> bool {
        self.null_tokens.iter().any(|t| t == field)
    }
}

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("csv parse error at record {record}: {source}")]
    Csv {
        record: u64,
        #[source]
        source: csv::Error,
    },
    #[error("field {column} of record {record} is not valid UTF-8")]
    Utf8 { record: u64, column: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Read a delimited stream into a [`Table`]. Gzip input is detected by its magic bytes and
/// decompressed on the fly.
///
/// An input without any records yields the 0×0 table; a header without data rows yields a
/// zero-row table whose columns are all `String`.
pub fn read_delimited<R: BufRead>(mut reader: R, options: &CsvOptions) -> Result<Table, CsvError> {
    if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
        log::debug!("input is gzip-compressed");
        return read_records(MultiGzDecoder::new(reader), options);
    }
    read_records(reader, options)
}

fn read_records<R: Read>(reader: R, options: &CsvOptions) -> Result<Table, CsvError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled here so that missing names can be filled in.
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut record = ByteRecord::new();
    let mut record_index: u64 = 0;
    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut column_count = 0usize;

    loop {
        record.clear();
        let more = csv_reader
            .read_byte_record(&mut record)
            .map_err(|source| CsvError::Csv {
                record: record_index + 1,
                source,
            })?;
        if !more {
            break;
        }
        record_index += 1;
        let fields = decode_record(&record, record_index, options)?;
        column_count = column_count.max(fields.len());

        if options.has_header && header.is_none() {
            header = Some(fields);
        } else {
            rows.push(
                fields
                    .into_iter()
                    .map(|f| (!options.is_null(&f)).then_some(f))
                    .collect(),
            );
        }
    }

    if record_index == 0 {
        return Ok(Table::empty());
    }

    let mut names = header.unwrap_or_default();
    for (idx, name) in names.iter_mut().enumerate() {
        if name.is_empty() {
            *name = column_name(idx);
        }
    }
    names.extend((names.len()..column_count).map(column_name));
    let names = dedup_names(names);

    let ragged = rows.iter().filter(|r| r.len() < column_count).count();
    if ragged > 0 {
        log::debug!("padded {ragged} short records with nulls");
    }

    let sample = options.sample_rows.unwrap_or(rows.len()).min(rows.len());
    let columns = names
        .into_iter()
        .enumerate()
        .map(|(col, name)| {
            let cells: Vec<Option<&str>> = rows
                .iter()
                .map(|r| r.get(col).and_then(|f| f.as_deref()))
                .collect();
            build_column(name, &cells, sample)
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("read {} rows x {} columns", rows.len(), columns.len());
    Ok(Table::new(columns)?)
}

/// Open `path` and read it with [`read_delimited`].
pub fn read_path(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Table, CsvError> {
    let file = File::open(path.as_ref())?;
    read_delimited(BufReader::new(file), options)
}

fn column_name(idx: usize) -> String {
    format!("Column{}", idx + 1)
}

/// Repeated header names get `_2`, `_3`, ... appended, skipping suffixes already taken.
fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let renamed = (2..)
                .map(|n| format!("{name}_{n}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            log::debug!("renamed repeated header {name} to {renamed}");
            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            renamed
        })
        .collect()
}

fn decode_record(
    record: &ByteRecord,
    record_index: u64,
    options: &CsvOptions,
) -> Result<Vec<String>, CsvError> {
    record
        .iter()
        .enumerate()
        .map(|(col, raw)| {
            let text = std::str::from_utf8(raw).map_err(|_| CsvError::Utf8 {
                record: record_index,
                column: col as u64 + 1,
            })?;
            Ok(if options.trim { text.trim() } else { text }.to_string())
        })
        .collect()
}

fn parse_bool(v: &str) -> Option<bool> {
    if v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_column_type(cells: &[Option<&str>]) -> ColumnType {
    let mut is_int = true;
    let mut is_double = true;
    let mut is_bool = true;
    let mut saw_value = false;

    for v in cells.iter().flatten() {
        saw_value = true;
        if v.parse::<i64>().is_err() {
            is_int = false;
        }
        if v.parse::<f64>().is_err() {
            is_double = false;
        }
        if parse_bool(v).is_none() {
            is_bool = false;
        }
        if !(is_int || is_double || is_bool) {
            break;
        }
    }

    if !saw_value {
        ColumnType::String
    } else if is_int {
        ColumnType::Int
    } else if is_double {
        ColumnType::Double
    } else if is_bool {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

fn parse_typed_value(field: &str, column_type: ColumnType) -> Option<Value> {
    match column_type {
        ColumnType::Int => field.parse::<i64>().ok().map(Value::Int),
        ColumnType::Double => field.parse::<f64>().ok().map(Value::Double),
        ColumnType::Boolean => parse_bool(field).map(Value::Boolean),
        ColumnType::String | ColumnType::Object => Some(Value::from(field)),
    }
}

/// Convert one column of raw fields. A field outside the sample that does not parse under the
/// sampled kind demotes the column to `String`.
fn build_column(name: String, cells: &[Option<&str>], sample: usize) -> Result<Column, CsvError> {
    let column_type = infer_column_type(&cells[..sample]);
    let typed: Option<Vec<Value>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(Value::Null),
            Some(field) => parse_typed_value(field, column_type),
        })
        .collect();

    let column = match typed {
        Some(values) => Column::new(name, column_type, values)?,
        None => {
            log::warn!("column {name} has values outside its sampled kind {column_type}; reading it as str");
            Column::strings(name, cells.iter().copied())
        }
    };
    Ok(column)
}

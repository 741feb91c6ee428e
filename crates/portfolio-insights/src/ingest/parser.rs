use std::io::Read;

/// A CSV export exactly as read, before any coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Cell at `row`/`column`; short rows read as blank.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Header names must be valid UTF-8 to be matched. A cell with stray bytes
/// keeps its readable part and is left to per-column coercion.
pub(crate) fn read_table<R: Read>(reader: R) -> Result<RawTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(|header| header.replace(['\u{feff}', '\u{200b}'], "").trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.byte_records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

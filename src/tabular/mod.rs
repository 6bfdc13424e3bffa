//! Table files for the pipeline scenario
//!
//! Tables are CSV files with a header row. Reading and writing go through the
//! `csv` crate; this module only adds column lookup and computed columns.

use std::path::Path;

use crate::parallel::TaskError;

/// In-memory table: a header row plus string cells
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell value for `column`, if the column exists
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|header| header == column)
            .and_then(|index| self.values.get(index))
            .map(String::as_str)
    }

    /// Cell value for `column` parsed as a number
    pub fn number(&self, column: &str) -> Result<f64, TaskError> {
        let raw = self
            .get(column)
            .ok_or_else(|| TaskError::MissingData(format!("column '{column}' is missing")))?;
        raw.trim().parse::<f64>().map_err(|_| {
            TaskError::MissingData(format!("column '{column}' holds a non-numeric value '{raw}'"))
        })
    }
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with empty cells
    pub fn push_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = values.into_iter().map(Into::into).collect();
        row.resize(self.headers.len().max(row.len()), String::new());
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == column)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            headers: &self.headers,
            values,
        })
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, column: &str) -> Option<Vec<&str>> {
        let index = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }

    /// Sum of a numeric column
    pub fn column_sum(&self, column: &str) -> Result<f64, TaskError> {
        self.rows().map(|row| row.number(column)).sum()
    }

    /// Render as aligned plain text, one line per row
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(String::len).collect();
        for row in &self.rows {
            for (index, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(index) {
                    *width = (*width).max(cell.len());
                }
            }
        }

        let render = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut lines = vec![render(self.headers.as_slice())];
        lines.extend(self.rows.iter().map(|row| render(row.as_slice())));
        lines.join("\n")
    }
}

/// Read a CSV table.
///
/// A missing or zero-byte file is [`TaskError::EmptyInput`].
pub fn read_table(path: &Path) -> Result<Table, TaskError> {
    let metadata = std::fs::metadata(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => {
            TaskError::EmptyInput(format!("file does not exist: '{}'", path.display()))
        }
        _ => with_path(path, err),
    })?;
    if metadata.len() == 0 {
        return Err(TaskError::EmptyInput(format!(
            "file is empty: '{}'",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path).map_err(|err| with_path(path, err))?;
    let mut table = Table::new(reader.headers().map_err(|err| with_path(path, err))?.iter());
    for record in reader.records() {
        let record = record.map_err(|err| with_path(path, err))?;
        table.push_row(record.iter());
    }
    Ok(table)
}

/// Write a table as CSV, replacing any existing file
pub fn write_table(path: &Path, table: &Table) -> Result<(), TaskError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| with_path(path, err))?;
    writer
        .write_record(table.headers())
        .map_err(|err| with_path(path, err))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|err| with_path(path, err))?;
    }
    writer.flush().map_err(|err| with_path(path, err))?;
    Ok(())
}

/// External failure tagged with the file it happened on
pub(crate) fn with_path(path: &Path, err: impl std::fmt::Display) -> TaskError {
    TaskError::External(format!("{}: {err}", path.display()))
}

/// Add (or overwrite) column `name`, computing each cell from its row.
///
/// The table is left untouched if any row fails.
pub fn add_computed_column<F>(mut table: Table, name: &str, compute: F) -> Result<Table, TaskError>
where
    F: Fn(&Row<'_>) -> Result<String, TaskError>,
{
    let values = table
        .rows()
        .map(|row| compute(&row))
        .collect::<Result<Vec<_>, _>>()?;

    let index = match table.column_index(name) {
        Some(index) => index,
        None => {
            table.headers.push(name.to_string());
            table.headers.len() - 1
        }
    };
    for (row, value) in table.rows.iter_mut().zip(values) {
        if row.len() <= index {
            row.resize(index + 1, String::new());
        }
        row[index] = value;
    }
    Ok(table)
}

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{
    rows_to_grid, ColumnSlot, MetadataColumn, MetadataValue, SpectralDataset,
    DEFAULT_SPECTRAL_GROUP,
};

/// Separator between group and label in flat (single-row) column names.
pub const GROUP_SEPARATOR: char = '|';

/// How to interpret a tabular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Top-level group whose columns are wavelengths.
    pub spectral_group: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            spectral_group: DEFAULT_SPECTRAL_GROUP.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectral dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – two header rows: group, then label. An empty group cell
///   continues the group to its left.
/// * `.parquet` – one column per cell with flat names `group|label`
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<SpectralDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, options),
        "csv" => load_csv(path, options),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!(
        "Loaded {} spectra × {} wavelengths from {}",
        dataset.len(),
        dataset.wavelengths.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Column assembly shared by both formats
// ---------------------------------------------------------------------------

/// Columns collected in file order, before the spectral ones are stacked.
struct TableBuilder<'o> {
    options: &'o LoadOptions,
    wavelengths: Vec<f64>,
    labels: Vec<String>,
    /// One vector per spectral column.
    spectral: Vec<Vec<f64>>,
    metadata: Vec<MetadataColumn>,
    layout: Vec<ColumnSlot>,
}

impl<'o> TableBuilder<'o> {
    fn new(options: &'o LoadOptions) -> Self {
        Self {
            options,
            wavelengths: Vec::new(),
            labels: Vec::new(),
            spectral: Vec::new(),
            metadata: Vec::new(),
            layout: Vec::new(),
        }
    }

    fn is_spectral(&self, group: &str) -> bool {
        group == self.options.spectral_group
    }

    fn push_spectral(&mut self, label: &str, values: Vec<f64>) -> Result<()> {
        let wavelength = label.trim().parse::<f64>().with_context(|| {
            format!(
                "spectral column label '{label}' in group '{}' is not a number",
                self.options.spectral_group
            )
        })?;
        self.layout.push(ColumnSlot::Spectral(self.spectral.len()));
        self.wavelengths.push(wavelength);
        self.labels.push(label.to_string());
        self.spectral.push(values);
        Ok(())
    }

    fn push_metadata(&mut self, group: &str, name: &str, values: Vec<MetadataValue>) {
        self.layout.push(ColumnSlot::Metadata(self.metadata.len()));
        self.metadata.push(MetadataColumn::new(group, name, values));
    }

    fn finish(self, rows: usize) -> Result<SpectralDataset> {
        if self.spectral.is_empty() {
            bail!("no columns in spectral group '{}'", self.options.spectral_group);
        }
        // stored column-major while reading; transpose into rows of spectra
        let row_major: Vec<Vec<f64>> = (0..rows)
            .map(|r| self.spectral.iter().map(|col| col[r]).collect())
            .collect();
        let grid = rows_to_grid(self.wavelengths.len(), &row_major)?;
        let dataset = SpectralDataset::from_parts(
            self.options.spectral_group.clone(),
            self.wavelengths,
            self.labels,
            grid,
            self.metadata,
            Some(self.layout),
        )?;
        Ok(dataset)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:
///
/// ```text
/// meta,,wvl,wvl,wvl
/// target,distance,585.149,585.195,585.241
/// rock_a,1.5,1021.0,1017.5,1030.0
/// ```
///
/// Spectral cells that are empty read as NaN; metadata cells are typed by
/// guessing (integer, float, bool, text, null).
fn load_csv(path: &Path, options: &LoadOptions) -> Result<SpectralDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("opening CSV")?;
    let mut records = reader.records();

    let group_row = records
        .next()
        .context("CSV missing group header row")?
        .context("reading CSV group header")?;
    let label_row = records
        .next()
        .context("CSV missing label header row")?
        .context("reading CSV label header")?;
    if group_row.len() != label_row.len() {
        bail!(
            "CSV header rows differ in length: {} groups, {} labels",
            group_row.len(),
            label_row.len()
        );
    }

    let mut groups = Vec::with_capacity(group_row.len());
    let mut current = String::new();
    for g in group_row.iter() {
        if !g.is_empty() {
            current = g.to_string();
        }
        groups.push(current.clone());
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); groups.len()];
    let mut rows = 0;
    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV data row {row_no}"))?;
        for (col, cell) in cells.iter_mut().zip(record.iter()) {
            col.push(cell.to_string());
        }
        rows += 1;
    }

    let mut table = TableBuilder::new(options);
    for ((group, label), column) in groups.iter().zip(label_row.iter()).zip(cells) {
        if table.is_spectral(group) {
            let values = column
                .iter()
                .enumerate()
                .map(|(row, cell)| parse_intensity(cell, row, label))
                .collect::<Result<Vec<f64>>>()?;
            table.push_spectral(label, values)?;
        } else {
            let values = column.iter().map(|c| MetadataValue::parse_guess(c)).collect();
            table.push_metadata(group, label, values);
        }
    }
    table.finish(rows)
}

fn parse_intensity(cell: &str, row: usize, label: &str) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .with_context(|| format!("Row {row}, column {label}: '{cell}' is not a number"))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Split a flat `group|label` column name. Names without the separator
/// belong to no group.
pub fn split_column_name(name: &str) -> (&str, &str) {
    name.split_once(GROUP_SEPARATOR).unwrap_or(("", name))
}

/// Load a Parquet file with one column per table cell.
///
/// Spectral columns must be numeric; any other column is metadata
/// (strings, ints, floats, bools).
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<SpectralDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let n_cols = schema.fields().len();
    let mut spectral: Vec<Vec<f64>> = vec![Vec::new(); n_cols];
    let mut metadata: Vec<Vec<MetadataValue>> = vec![Vec::new(); n_cols];
    let mut rows = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, field) in schema.fields().iter().enumerate() {
            let (group, _) = split_column_name(field.name());
            let col = batch.column(idx);
            if group == options.spectral_group {
                let values = extract_f64_column(col)
                    .with_context(|| format!("spectral column '{}'", field.name()))?;
                spectral[idx].extend(values);
            } else {
                metadata[idx].extend((0..col.len()).map(|row| extract_metadata_value(col, row)));
            }
        }
        rows += batch.num_rows();
    }

    let mut table = TableBuilder::new(options);
    for (idx, field) in schema.fields().iter().enumerate() {
        let (group, label) = split_column_name(field.name());
        if table.is_spectral(group) {
            table.push_spectral(label, std::mem::take(&mut spectral[idx]))?;
        } else {
            table.push_metadata(group, label, std::mem::take(&mut metadata[idx]));
        }
    }
    table.finish(rows)
}

// -- Parquet / Arrow helpers --

/// Read a numeric column as `f64`, nulls as NaN.
fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    macro_rules! widen {
        ($ty:ty) => {
            col.as_primitive_opt::<$ty>()
                .map(|a| a.iter().map(|v| v.map_or(f64::NAN, |x| x as f64)).collect())
        };
    }
    let values: Option<Vec<f64>> = match col.data_type() {
        DataType::Float64 => widen!(Float64Type),
        DataType::Float32 => widen!(Float32Type),
        DataType::Int64 => widen!(Int64Type),
        DataType::Int32 => widen!(Int32Type),
        DataType::Int16 => widen!(Int16Type),
        DataType::Int8 => widen!(Int8Type),
        other => bail!("expected a numeric column, got {other:?}"),
    };
    values.context("column data does not match its declared type")
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| MetadataValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| MetadataValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_boolean_opt()
            .map(|a| MetadataValue::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| MetadataValue::String(format!("{:?}", col.data_type())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rusty_baseline_loader_{}_{name}", std::process::id()))
    }

    #[test]
    fn column_names_split_on_the_first_separator() {
        assert_eq!(split_column_name("wvl|585.149"), ("wvl", "585.149"));
        assert_eq!(split_column_name("meta|a|b"), ("meta", "a|b"));
        assert_eq!(split_column_name("id"), ("", "id"));
    }

    #[test]
    fn csv_with_two_header_rows() {
        let path = temp_path("two_headers.csv");
        std::fs::write(
            &path,
            "meta,,wvl,wvl,wvl\n\
             target,distance,585.149,585.195,600.0\n\
             rock_a,1.5,1021.0,1017.5,1030.0\n\
             rock_b,,998.0,,1002.25\n",
        )
        .unwrap();
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.wavelengths, vec![585.149, 585.195, 600.0]);
        assert_eq!(ds.wavelength_labels, vec!["585.149", "585.195", "600.0"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.spectra[[0, 1]], 1017.5);
        assert!(ds.spectra[[1, 1]].is_nan());

        let distance = ds.metadata_column("distance").unwrap();
        assert_eq!(distance.group, "meta");
        assert_eq!(distance.values, vec![MetadataValue::Float(1.5), MetadataValue::Null]);
        assert_eq!(
            ds.layout,
            vec![
                ColumnSlot::Metadata(0),
                ColumnSlot::Metadata(1),
                ColumnSlot::Spectral(0),
                ColumnSlot::Spectral(1),
                ColumnSlot::Spectral(2),
            ]
        );
    }

    #[test]
    fn custom_spectral_group() {
        let path = temp_path("custom_group.csv");
        std::fs::write(&path, "id,intensity,intensity\nid,1.0,2.0\n7,3.0,4.0\n").unwrap();
        let opts = LoadOptions {
            spectral_group: "intensity".into(),
        };
        let ds = load_file(&path, &opts).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ds.spectral_group, "intensity");
        assert_eq!(ds.wavelengths, vec![1.0, 2.0]);
        assert_eq!(ds.metadata[0].values, vec![MetadataValue::Integer(7)]);
    }

    #[test]
    fn non_numeric_wavelength_label_is_an_error() {
        let path = temp_path("bad_label.csv");
        std::fs::write(&path, "wvl,wvl\n500.0,peak\n1.0,2.0\n").unwrap();
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("'peak'"));
    }

    #[test]
    fn missing_spectral_group_is_an_error() {
        let path = temp_path("no_spectra.csv");
        std::fs::write(&path, "meta\nid\n1\n").unwrap();
        assert!(load_file(&path, &LoadOptions::default()).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("spectra.xlsx"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}

use std::fmt;

use ndarray::{Array2, ArrayView1};
use thiserror::Error;

/// Group name of the spectral columns unless a file says otherwise.
pub const DEFAULT_SPECTRAL_GROUP: &str = "wvl";

// ---------------------------------------------------------------------------
// DatasetError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("{wavelengths} wavelengths but the spectra grid has {columns} columns")]
    WavelengthCount { wavelengths: usize, columns: usize },

    #[error("{labels} wavelength labels for {wavelengths} wavelengths")]
    LabelCount { labels: usize, wavelengths: usize },

    #[error("spectrum {row} has {found} values, expected {expected}")]
    RowLength { row: usize, expected: usize, found: usize },

    #[error("metadata column '{column}' has {found} values, expected {expected}")]
    MetadataLength { column: String, expected: usize, found: usize },

    #[error("column layout does not cover every column exactly once")]
    Layout,
}

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata cell.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => Ok(()),
        }
    }
}

impl MetadataValue {
    /// Guess the type of a text cell: integer, float, bool, then text.
    /// Empty cells are null.
    pub fn parse_guess(s: &str) -> Self {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// MetadataColumn / ColumnSlot
// ---------------------------------------------------------------------------

/// A non-spectral column, carried through baseline removal untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataColumn {
    /// Top-level group the column belongs to (e.g. `meta`).
    pub group: String,
    pub name: String,
    pub values: Vec<MetadataValue>,
}

impl MetadataColumn {
    pub fn new(group: impl Into<String>, name: impl Into<String>, values: Vec<MetadataValue>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            values,
        }
    }
}

/// Position of one source column: a wavelength index or a metadata index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSlot {
    Spectral(usize),
    Metadata(usize),
}

/// A borrowed view of one column, in file order.
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef<'a> {
    Spectral {
        label: &'a str,
        values: ArrayView1<'a, f64>,
    },
    Metadata(&'a MetadataColumn),
}

// ---------------------------------------------------------------------------
// SpectralDataset
// ---------------------------------------------------------------------------

/// Spectra sharing one wavelength axis, plus metadata columns.
///
/// `spectra` is rows = spectra, columns = `wavelengths`. `layout` records
/// where each spectral and metadata column sat in the source table so the
/// table can be written back in its original shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralDataset {
    pub spectral_group: String,
    pub wavelengths: Vec<f64>,
    /// Column labels of the spectral group, as read (e.g. `"585.149"`).
    pub wavelength_labels: Vec<String>,
    pub spectra: Array2<f64>,
    pub metadata: Vec<MetadataColumn>,
    pub layout: Vec<ColumnSlot>,
}

impl SpectralDataset {
    /// Spectral-only dataset under the default group, labelled by wavelength.
    pub fn new(wavelengths: Vec<f64>, spectra: Array2<f64>) -> Result<Self, DatasetError> {
        let labels = wavelengths.iter().map(|w| w.to_string()).collect();
        Self::from_parts(
            DEFAULT_SPECTRAL_GROUP,
            wavelengths,
            labels,
            spectra,
            Vec::new(),
            None,
        )
    }

    /// Build from row vectors, checking that every row matches the axis.
    pub fn from_rows(wavelengths: Vec<f64>, rows: &[Vec<f64>]) -> Result<Self, DatasetError> {
        let grid = rows_to_grid(wavelengths.len(), rows)?;
        Self::new(wavelengths, grid)
    }

    /// Append metadata columns after the spectral columns.
    pub fn with_metadata(mut self, columns: Vec<MetadataColumn>) -> Result<Self, DatasetError> {
        for col in columns {
            check_metadata_len(&col, self.len())?;
            self.layout.push(ColumnSlot::Metadata(self.metadata.len()));
            self.metadata.push(col);
        }
        Ok(self)
    }

    /// Assemble a dataset from its parts. `layout = None` places the
    /// spectral columns first, then the metadata columns.
    pub fn from_parts(
        spectral_group: impl Into<String>,
        wavelengths: Vec<f64>,
        wavelength_labels: Vec<String>,
        spectra: Array2<f64>,
        metadata: Vec<MetadataColumn>,
        layout: Option<Vec<ColumnSlot>>,
    ) -> Result<Self, DatasetError> {
        let (rows, cols) = spectra.dim();
        if wavelengths.len() != cols {
            return Err(DatasetError::WavelengthCount {
                wavelengths: wavelengths.len(),
                columns: cols,
            });
        }
        if wavelength_labels.len() != wavelengths.len() {
            return Err(DatasetError::LabelCount {
                labels: wavelength_labels.len(),
                wavelengths: wavelengths.len(),
            });
        }
        for col in &metadata {
            check_metadata_len(col, rows)?;
        }

        let layout = match layout {
            Some(layout) => {
                check_layout(&layout, cols, metadata.len())?;
                layout
            }
            None => (0..cols)
                .map(ColumnSlot::Spectral)
                .chain((0..metadata.len()).map(ColumnSlot::Metadata))
                .collect(),
        };

        Ok(Self {
            spectral_group: spectral_group.into(),
            wavelengths,
            wavelength_labels,
            spectra,
            metadata,
            layout,
        })
    }

    /// Same labels, metadata and column order, with a new spectra grid of
    /// identical shape.
    pub fn with_spectra(&self, spectra: Array2<f64>) -> Self {
        debug_assert_eq!(spectra.dim(), self.spectra.dim());
        Self {
            spectral_group: self.spectral_group.clone(),
            wavelengths: self.wavelengths.clone(),
            wavelength_labels: self.wavelength_labels.clone(),
            spectra,
            metadata: self.metadata.clone(),
            layout: self.layout.clone(),
        }
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.nrows()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.spectra.nrows() == 0
    }

    /// Columns in source order.
    pub fn columns(&self) -> impl Iterator<Item = ColumnRef<'_>> + '_ {
        self.layout.iter().map(move |slot| match *slot {
            ColumnSlot::Spectral(i) => ColumnRef::Spectral {
                label: &self.wavelength_labels[i],
                values: self.spectra.column(i),
            },
            ColumnSlot::Metadata(i) => ColumnRef::Metadata(&self.metadata[i]),
        })
    }

    pub fn metadata_column(&self, name: &str) -> Option<&MetadataColumn> {
        self.metadata.iter().find(|c| c.name == name)
    }
}

/// Stack equally long rows into a grid.
pub fn rows_to_grid(width: usize, rows: &[Vec<f64>]) -> Result<Array2<f64>, DatasetError> {
    let mut grid = Array2::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(DatasetError::RowLength {
                row: i,
                expected: width,
                found: row.len(),
            });
        }
        for (dst, src) in grid.row_mut(i).iter_mut().zip(row) {
            *dst = *src;
        }
    }
    Ok(grid)
}

fn check_metadata_len(col: &MetadataColumn, rows: usize) -> Result<(), DatasetError> {
    if col.values.len() != rows {
        return Err(DatasetError::MetadataLength {
            column: col.name.clone(),
            expected: rows,
            found: col.values.len(),
        });
    }
    Ok(())
}

fn check_layout(layout: &[ColumnSlot], spectral: usize, metadata: usize) -> Result<(), DatasetError> {
    let mut seen_spectral = vec![false; spectral];
    let mut seen_metadata = vec![false; metadata];
    for slot in layout {
        let seen = match *slot {
            ColumnSlot::Spectral(i) => seen_spectral.get_mut(i),
            ColumnSlot::Metadata(i) => seen_metadata.get_mut(i),
        };
        match seen {
            Some(flag) if !*flag => *flag = true,
            _ => return Err(DatasetError::Layout),
        }
    }
    if layout.len() != spectral + metadata {
        return Err(DatasetError::Layout);
    }
    Ok(())
}

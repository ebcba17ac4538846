use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::loader::GROUP_SEPARATOR;
use super::model::{ColumnRef, MetadataColumn, MetadataValue, SpectralDataset};

/// Write `dataset` as CSV with a group header row and a label header row,
/// in the dataset's column order.
pub fn write_csv(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let (groups, labels): (Vec<&str>, Vec<&str>) = dataset
        .columns()
        .map(|col| match col {
            ColumnRef::Spectral { label, .. } => (dataset.spectral_group.as_str(), label),
            ColumnRef::Metadata(m) => (m.group.as_str(), m.name.as_str()),
        })
        .unzip();
    writer.write_record(&groups).context("writing CSV group header")?;
    writer.write_record(&labels).context("writing CSV label header")?;

    let columns: Vec<ColumnRef<'_>> = dataset.columns().collect();
    for row in 0..dataset.len() {
        let record = columns.iter().map(|col| match col {
            ColumnRef::Spectral { values, .. } => values[row].to_string(),
            ColumnRef::Metadata(m) => m.values[row].to_string(),
        });
        writer
            .write_record(record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    log::info!("Wrote {} spectra to {}", dataset.len(), path.display());
    Ok(())
}

/// Write `dataset` as Parquet, one column per table column, named
/// `group|label`.
pub fn write_parquet(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();

    for col in dataset.columns() {
        match col {
            ColumnRef::Spectral { label, values } => {
                let name = format!("{}{GROUP_SEPARATOR}{label}", dataset.spectral_group);
                fields.push(Field::new(name, DataType::Float64, false));
                arrays.push(Arc::new(Float64Array::from(values.to_vec())));
            }
            ColumnRef::Metadata(m) => {
                let name = format!("{}{GROUP_SEPARATOR}{}", m.group, m.name);
                let array = metadata_array(m);
                fields.push(Field::new(name, array.data_type().clone(), true));
                arrays.push(array);
            }
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    log::info!("Wrote {} spectra to {}", dataset.len(), path.display());
    Ok(())
}

/// Narrowest Arrow type that holds every non-null value of the column.
fn metadata_array(column: &MetadataColumn) -> ArrayRef {
    let present = || column.values.iter().filter(|v| **v != MetadataValue::Null);
    let all = |pred: fn(&MetadataValue) -> bool| present().all(pred);

    if present().next().is_some() && all(|v| matches!(v, MetadataValue::Integer(_))) {
        let values = column.values.iter().map(|v| match v {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        });
        return Arc::new(Int64Array::from_iter(values));
    }
    if present().next().is_some()
        && all(|v| matches!(v, MetadataValue::Integer(_) | MetadataValue::Float(_)))
    {
        let values = column.values.iter().map(|v| match v {
            MetadataValue::Integer(i) => Some(*i as f64),
            MetadataValue::Float(f) => Some(*f),
            _ => None,
        });
        return Arc::new(Float64Array::from_iter(values));
    }
    if present().next().is_some() && all(|v| matches!(v, MetadataValue::Bool(_))) {
        let values = column.values.iter().map(|v| match v {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        });
        return Arc::new(BooleanArray::from_iter(values));
    }
    let values = column.values.iter().map(|v| match v {
        MetadataValue::Null => None,
        other => Some(other.to_string()),
    });
    Arc::new(StringArray::from_iter(values))
}

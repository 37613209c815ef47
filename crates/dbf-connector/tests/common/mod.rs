//! Shared helpers: build dBASE tables on disk and read Parquet back.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use arrow_array::{
    Array, BooleanArray, Date32Array, Float64Array, Int64Array, RecordBatch, StringArray,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Builds a dBASE III table byte-for-byte.
#[derive(Debug, Default)]
pub struct TableBuilder {
    language_driver: u8,
    fields: Vec<(String, u8, u8, u8)>,
    records: Vec<Vec<u8>>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language_driver(mut self, id: u8) -> Self {
        self.language_driver = id;
        self
    }

    pub fn field(mut self, name: &str, tag: u8, width: u8, decimals: u8) -> Self {
        self.fields.push((name.to_string(), tag, width, decimals));
        self
    }

    /// Active record; each value is space-padded (or cut) to its width.
    pub fn record(self, values: &[&[u8]]) -> Self {
        self.push_record(b' ', values)
    }

    /// Soft-deleted record.
    pub fn deleted(self, values: &[&[u8]]) -> Self {
        self.push_record(b'*', values)
    }

    fn push_record(mut self, marker: u8, values: &[&[u8]]) -> Self {
        assert_eq!(values.len(), self.fields.len());
        let mut record = vec![marker];
        for (value, (_, _, width, _)) in values.iter().zip(&self.fields) {
            let width = usize::from(*width);
            let mut cell = value[..value.len().min(width)].to_vec();
            cell.resize(width, b' ');
            record.extend_from_slice(&cell);
        }
        self.records.push(record);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let header_len = 32 + 32 * self.fields.len() + 1;
        let record_len = 1 + self
            .fields
            .iter()
            .map(|(_, _, w, _)| usize::from(*w))
            .sum::<usize>();

        let mut bytes = vec![0u8; 32];
        bytes[0] = 0x03;
        bytes[1..4].copy_from_slice(&[123, 1, 15]);
        let count = u32::try_from(self.records.len()).unwrap();
        bytes[4..8].copy_from_slice(&count.to_le_bytes());
        bytes[8..10].copy_from_slice(&u16::try_from(header_len).unwrap().to_le_bytes());
        bytes[10..12].copy_from_slice(&u16::try_from(record_len).unwrap().to_le_bytes());
        bytes[0x1D] = self.language_driver;

        for (name, tag, width, decimals) in &self.fields {
            let mut descriptor = [0u8; 32];
            descriptor[..name.len()].copy_from_slice(name.as_bytes());
            descriptor[11] = *tag;
            descriptor[16] = *width;
            descriptor[17] = *decimals;
            bytes.extend_from_slice(&descriptor);
        }
        bytes.push(0x0D);
        for record in &self.records {
            bytes.extend_from_slice(record);
        }
        bytes.push(0x1A);
        bytes
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.bytes()).unwrap();
        path
    }
}

/// Reads every batch of a Parquet file.
pub fn read_parquet(path: &Path) -> Vec<RecordBatch> {
    let data = bytes::Bytes::from(fs::read(path).unwrap());
    ParquetRecordBatchReaderBuilder::try_new(data)
        .unwrap()
        .build()
        .unwrap()
        .map(Result::unwrap)
        .collect()
}

/// Row counts of each row group in a Parquet file.
pub fn row_group_sizes(path: &Path) -> Vec<i64> {
    let data = bytes::Bytes::from(fs::read(path).unwrap());
    let builder = ParquetRecordBatchReaderBuilder::try_new(data).unwrap();
    builder
        .metadata()
        .row_groups()
        .iter()
        .map(|rg| rg.num_rows())
        .collect()
}

/// Text column across batches.
pub fn strings(batches: &[RecordBatch], index: usize) -> Vec<Option<String>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column(index).as_any().downcast_ref::<StringArray>().unwrap();
            col.iter().map(|v| v.map(str::to_string)).collect::<Vec<_>>()
        })
        .collect()
}

/// Int64 column across batches.
pub fn ints(batches: &[RecordBatch], index: usize) -> Vec<Option<i64>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column(index).as_any().downcast_ref::<Int64Array>().unwrap();
            col.iter().collect::<Vec<_>>()
        })
        .collect()
}

/// Float64 column across batches.
pub fn floats(batches: &[RecordBatch], index: usize) -> Vec<Option<f64>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column(index).as_any().downcast_ref::<Float64Array>().unwrap();
            col.iter().collect::<Vec<_>>()
        })
        .collect()
}

/// Boolean column across batches.
pub fn bools(batches: &[RecordBatch], index: usize) -> Vec<Option<bool>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column(index).as_any().downcast_ref::<BooleanArray>().unwrap();
            col.iter().collect::<Vec<_>>()
        })
        .collect()
}

/// Date32 column across batches.
pub fn dates(batches: &[RecordBatch], index: usize) -> Vec<Option<i32>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column(index).as_any().downcast_ref::<Date32Array>().unwrap();
            col.iter().collect::<Vec<_>>()
        })
        .collect()
}

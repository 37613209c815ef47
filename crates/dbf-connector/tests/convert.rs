//! End-to-end conversion: `.dbf` bytes on disk in, Parquet file out.

mod common;

use std::fs;

use arrow_schema::DataType;
use common::{bools, dates, floats, ints, read_parquet, row_group_sizes, strings, TableBuilder};
use dbf_connector::{convert, ConvertConfig, DeletedPolicy, EncodingChoice};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// `NAME C(20)`, `AGE N(3)`, `DT D`; five records, the third deleted.
fn people() -> TableBuilder {
    TableBuilder::new()
        .language_driver(0x00)
        .field("NAME", b'C', 20, 0)
        .field("AGE", b'N', 3, 0)
        .field("DT", b'D', 8, 0)
        .record(&[b"ALICE", b"30", b"20230115"])
        .record(&[b"BOB", b"45", b"19991231"])
        .deleted(&[b"CAROL", b"22", b"20000101"])
        .record(&[b"DAVI", b"", b""])
        .record(&[b"Jos\xe9", b"7", b"00000000"])
}

#[test]
fn test_three_fields_five_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = people().write(dir.path(), "people.dbf");
    let output = dir.path().join("people.parquet");

    let summary = convert(&input, &output, &ConvertConfig::default()).unwrap();
    assert_eq!(summary.encoding, "CP1252");
    assert_eq!(summary.records_scanned, 5);
    assert_eq!(summary.rows_written, 4);
    assert_eq!(summary.deleted_skipped, 1);
    assert_eq!(summary.batches_written, 1);

    let batches = read_parquet(&output);
    let schema = batches[0].schema();
    let types: Vec<&DataType> = schema.fields().iter().map(|f| f.data_type()).collect();
    assert_eq!(types, vec![&DataType::Utf8, &DataType::Int64, &DataType::Date32]);
    assert!(schema.fields().iter().all(|f| f.is_nullable()));

    assert_eq!(
        strings(&batches, 0),
        vec![
            Some("ALICE".to_string()),
            Some("BOB".to_string()),
            Some("DAVI".to_string()),
            Some("José".to_string()),
        ]
    );
    assert_eq!(ints(&batches, 1), vec![Some(30), Some(45), None, Some(7)]);
    assert_eq!(dates(&batches, 2), vec![Some(19_372), Some(10_956), None, None]);
}

#[test]
fn test_keep_deleted_emits_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let input = people().write(dir.path(), "people.dbf");
    let output = dir.path().join("people.parquet");

    let config = ConvertConfig::default().with_deleted(DeletedPolicy::Keep);
    let summary = convert(&input, &output, &config).unwrap();
    assert_eq!(summary.rows_written, 5);
    assert_eq!(summary.deleted_skipped, 0);

    let batches = read_parquet(&output);
    assert_eq!(strings(&batches, 0)[2], Some("CAROL".to_string()));
    assert_eq!(dates(&batches, 2)[2], Some(10_957));
}

#[test]
fn test_batches_respect_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = TableBuilder::new().field("N", b'N', 4, 0);
    for i in 0..7 {
        table = table.record(&[i.to_string().as_bytes()]);
    }
    let input = table.write(dir.path(), "seq.dbf");
    let output = dir.path().join("seq.parquet");

    let config = ConvertConfig::default().with_batch_size(3);
    let summary = convert(&input, &output, &config).unwrap();
    assert_eq!(summary.batches_written, 3);
    assert_eq!(row_group_sizes(&output), vec![3, 3, 1]);

    let values: Vec<i64> = ints(&read_parquet(&output), 0).into_iter().flatten().collect();
    assert_eq!(values, (0..7).collect::<Vec<_>>());
}

#[test]
fn test_skipped_rows_do_not_count_toward_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .field("N", b'N', 2, 0)
        .record(&[b"1"])
        .deleted(&[b"2"])
        .record(&[b"3"])
        .deleted(&[b"4"])
        .record(&[b"5"])
        .record(&[b"6"])
        .write(dir.path(), "t.dbf");
    let output = dir.path().join("t.parquet");

    convert(&input, &output, &ConvertConfig::default().with_batch_size(2)).unwrap();
    assert_eq!(row_group_sizes(&output), vec![2, 2]);
}

#[test]
fn test_typed_columns_and_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .language_driver(0x57)
        .field("PRICE", b'N', 8, 2)
        .field("BIG", b'N', 12, 0)
        .field("ACTIVE", b'L', 1, 0)
        .field("DT", b'D', 8, 0)
        .field("NOTE", b'M', 10, 0)
        .record(&[b"12.50", b"1234567890", b"T", b"2023013", b"0000000012"])
        .record(&[b"-0.75", b"", b"n", b"19700101", b""])
        .record(&[b"********", b"42", b"?", b"", b"x"])
        .record(&[b"", b"-5", b"Y", b"2023-1-1", b""])
        .record(&[b"3", b"0", b" ", b"20240229", b""])
        .write(dir.path(), "typed.dbf");
    let output = dir.path().join("typed.parquet");

    convert(&input, &output, &ConvertConfig::default()).unwrap();
    let batches = read_parquet(&output);
    let schema = batches[0].schema();
    assert_eq!(schema.field(0).data_type(), &DataType::Float64);
    assert_eq!(schema.field(1).data_type(), &DataType::Int64);
    assert_eq!(schema.field(2).data_type(), &DataType::Boolean);
    assert_eq!(schema.field(3).data_type(), &DataType::Date32);
    assert_eq!(schema.field(4).data_type(), &DataType::Utf8);

    assert_eq!(
        floats(&batches, 0),
        vec![Some(12.5), Some(-0.75), None, None, Some(3.0)]
    );
    assert_eq!(
        ints(&batches, 1),
        vec![Some(1_234_567_890), None, Some(42), Some(-5), Some(0)]
    );
    assert_eq!(
        bools(&batches, 2),
        vec![Some(true), Some(false), None, Some(true), None]
    );
    assert_eq!(
        dates(&batches, 3),
        vec![None, Some(0), None, None, Some(19_782)]
    );
    assert_eq!(
        strings(&batches, 4),
        vec![Some("0000000012".to_string()), None, Some("x".to_string()), None, None]
    );
}

#[test]
fn test_lossy_substitutes_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .field("NAME", b'C', 6, 0)
        .record(&[b"ab\xffcd"])
        .write(dir.path(), "t.dbf");
    let output = dir.path().join("t.parquet");

    let config = ConvertConfig::default().with_encoding(EncodingChoice::Explicit("utf-8".into()));
    convert(&input, &output, &config).unwrap();
    assert_eq!(
        strings(&read_parquet(&output), 0),
        vec![Some("ab?cd".to_string())]
    );
}

#[test]
fn test_strict_failure_is_fatal_and_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .field("NAME", b'C', 6, 0)
        .record(&[b"fine"])
        .record(&[b"ab\xffcd"])
        .write(dir.path(), "t.dbf");
    let output = dir.path().join("t.parquet");

    let config = ConvertConfig::default()
        .with_encoding(EncodingChoice::Explicit("utf-8".into()))
        .with_strict(true);
    let err = convert(&input, &output, &config).unwrap_err();
    assert_eq!(err.exit_code(), 6);
    assert!(err.to_string().contains("NAME"), "{err}");
    assert!(!output.exists());
}

#[test]
fn test_windows_page_undefined_byte() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .language_driver(0x03)
        .field("NAME", b'C', 4, 0)
        .record(&[b"a\x81b"])
        .write(dir.path(), "t.dbf");

    let lossy = dir.path().join("lossy.parquet");
    convert(&input, &lossy, &ConvertConfig::default()).unwrap();
    assert_eq!(strings(&read_parquet(&lossy), 0), vec![Some("a?b".to_string())]);

    let strict = dir.path().join("strict.parquet");
    let err = convert(&input, &strict, &ConvertConfig::default().with_strict(true)).unwrap_err();
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn test_oem_code_pages_from_driver() {
    let dir = tempfile::tempdir().unwrap();
    let cp850 = TableBuilder::new()
        .language_driver(0x7D)
        .field("CITY", b'C', 9, 0)
        .record(&[b"S\xc6o Paulo"])
        .write(dir.path(), "cp850.dbf");
    let cp437 = TableBuilder::new()
        .language_driver(0x7B)
        .field("WORD", b'C', 4, 0)
        .record(&[b"caf\x82"])
        .write(dir.path(), "cp437.dbf");

    let out850 = dir.path().join("cp850.parquet");
    let summary = convert(&cp850, &out850, &ConvertConfig::default()).unwrap();
    assert_eq!(summary.encoding, "CP850");
    assert_eq!(strings(&read_parquet(&out850), 0), vec![Some("São Paulo".to_string())]);

    let out437 = dir.path().join("cp437.parquet");
    let summary = convert(&cp437, &out437, &ConvertConfig::default()).unwrap();
    assert_eq!(summary.encoding, "CP437");
    assert_eq!(strings(&read_parquet(&out437), 0), vec![Some("café".to_string())]);
}

#[test]
fn test_explicit_encoding_overrides_driver() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .language_driver(0x7D)
        .field("W", b'C', 4, 0)
        .record(&[b"caf\xe9"])
        .write(dir.path(), "t.dbf");
    let output = dir.path().join("t.parquet");

    let config = ConvertConfig::default().with_encoding(EncodingChoice::Explicit("cp1252".into()));
    let summary = convert(&input, &output, &config).unwrap();
    assert_eq!(summary.encoding, "cp1252");
    assert_eq!(strings(&read_parquet(&output), 0), vec![Some("café".to_string())]);
}

#[test]
fn test_empty_table_writes_schema_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = TableBuilder::new()
        .field("NAME", b'C', 10, 0)
        .field("DT", b'D', 8, 0)
        .write(dir.path(), "empty.dbf");
    let output = dir.path().join("empty.parquet");

    let summary = convert(&input, &output, &ConvertConfig::default()).unwrap();
    assert_eq!(summary.rows_written, 0);
    assert_eq!(summary.batches_written, 0);

    let data = bytes::Bytes::from(fs::read(&output).unwrap());
    let builder = ParquetRecordBatchReaderBuilder::try_new(data).unwrap();
    assert_eq!(builder.metadata().num_row_groups(), 0);
    assert_eq!(builder.schema().field(1).data_type(), &DataType::Date32);
}

#[test]
fn test_dbc_with_sibling_table() {
    let dir = tempfile::tempdir().unwrap();
    people().write(dir.path(), "people.dbf");
    let input = dir.path().join("people.dbc");
    fs::write(&input, b"not really compressed").unwrap();
    let output = dir.path().join("people.parquet");

    let config = ConvertConfig::default().with_dbc_tool(dir.path().join("no-such-dbc2dbf"));
    let summary = convert(&input, &output, &config).unwrap();
    assert_eq!(summary.rows_written, 4);
    assert!(output.exists());
    assert!(!dir.path().join("people.parquet.dbf").exists());
}

#[test]
fn test_dbc_without_extractor_or_sibling() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lonely.dbc");
    fs::write(&input, b"data").unwrap();
    let output = dir.path().join("lonely.parquet");

    let config = ConvertConfig::default().with_dbc_tool(dir.path().join("no-such-dbc2dbf"));
    let err = convert(&input, &output, &config).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(!output.exists());
}

#[test]
fn test_missing_input_is_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.parquet");
    let err = convert(dir.path().join("missing.dbf"), &output, &ConvertConfig::default())
        .unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(!output.exists());
}

#[test]
fn test_invalid_config_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let input = people().write(dir.path(), "people.dbf");
    let output = dir.path().join("out.parquet");

    let err = convert(&input, &output, &ConvertConfig::default().with_batch_size(0)).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    let config =
        ConvertConfig::default().with_encoding(EncodingChoice::Explicit("no-such-page".into()));
    let err = convert(&input, &output, &config).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!output.exists());
}

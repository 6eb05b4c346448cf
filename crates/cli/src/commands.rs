//! One function per subcommand. Each returns the success message on `Ok`,
//! or propagates whatever [`store`] raised on `Err` — `main` is the only
//! place that turns an error into an exit code.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead};
use store::{Key, Store, StoreError, Value, ValueKind};

pub fn init(data_file: &str) -> Result<String> {
    Store::init(data_file)?;
    Ok("Data file was successfully initialized".to_string())
}

pub fn clear(data_file: &str) -> Result<String> {
    let mut store = Store::open(data_file)?;
    store.clear()?;
    Ok("Data file was successfully cleared".to_string())
}

pub fn add(data_file: &str, rest: &[String]) -> Result<String> {
    let [key, value] = require_args(rest, "add KEY VALUE")?;
    let mut store = Store::open(data_file)?;
    store.add(key, value)?;
    Ok("Item was successfully added to KV-Storage".to_string())
}

pub fn add_file(data_file: &str, rest: &[String]) -> Result<String> {
    let [key, path_to_file] = require_args(rest, "add_file KEY PATH_TO_FILE")?;
    let mut store = Store::open(data_file)?;
    store.add_file(key, path_to_file)?;
    Ok("Content of file was successfully added to KV-Storage".to_string())
}

pub fn get(data_file: &str, rest: &[String]) -> Result<String> {
    let [key] = require_args(rest, "get KEY")?;
    let mut store = Store::open(data_file)?;
    let value = store.get(key)?;
    Ok(format_value(&value))
}

pub fn get_file(data_file: &str, rest: &[String]) -> Result<String> {
    let [key, path_to_output_file] = require_args(rest, "get_file KEY PATH_TO_OUTPUT_FILE")?;
    let mut store = Store::open(data_file)?;
    store.get_file(key, path_to_output_file)?;
    Ok(format!(
        "Value of item with key {key} was successfully stored in output file {path_to_output_file}"
    ))
}

pub fn contains(data_file: &str, rest: &[String]) -> Result<String> {
    let [key] = require_args(rest, "contains KEY")?;
    let mut store = Store::open(data_file)?;
    Ok(if store.contains(key)? {
        "Data file contains item with such key".to_string()
    } else {
        "Data file doesn't contain item with such key".to_string()
    })
}

pub fn erase(data_file: &str, rest: &[String]) -> Result<String> {
    let [key] = require_args(rest, "erase KEY")?;
    let mut store = Store::open(data_file)?;
    store.erase(key)?;
    Ok("Item was successfully erased from KV-Storage".to_string())
}

pub fn change(data_file: &str, rest: &[String]) -> Result<String> {
    let [key, value_type, value] = require_args(rest, "change KEY {file|data} VALUE")?;
    let kind = match value_type.as_str() {
        "file" => ValueKind::File,
        "data" => ValueKind::Data,
        other => bail!("value_type must be 'file' or 'data', got '{other}'"),
    };
    let mut store = Store::open(data_file)?;
    store.change(key, kind, value)?;
    Ok(format!("Value of item with the key '{key}' was successfully changed"))
}

pub fn check_validity_of_file(data_file: &str) -> Result<String> {
    let mut store = Store::open(data_file)?;
    Ok(if store.check_validity_of_file() {
        "It is data file".to_string()
    } else {
        "It is not data file".to_string()
    })
}

pub fn get_all_keys(data_file: &str) -> Result<String> {
    let mut store = Store::open(data_file)?;
    let keys = store.get_all_keys()?;
    Ok(keys.iter().map(format_key).collect::<Vec<_>>().join("\n"))
}

fn format_key(key: &Key) -> String {
    match key {
        Key::Int(n) => n.to_string(),
        Key::Str(s) => s.clone(),
    }
}

pub fn add_package(data_file: &str, rest: &[String]) -> Result<String> {
    let mut store = Store::open(data_file)?;
    let rows = match parse_csv_flag(rest)? {
        Some(csv_path) => read_rows_from_csv(&csv_path)?,
        None => read_rows_from_stdin(),
    };

    store.add_package(&rows, |index, row| {
        eprintln!("row {index} ('{}','{}') could not be added, skipping", row.1, row.2);
    })?;
    Ok("All correct queries were executed".to_string())
}

/// Reads `argv` past `DATA_FILE` for an optional `-f CSV_PATH` flag.
fn parse_csv_flag(rest: &[String]) -> Result<Option<String>> {
    match rest {
        [] => Ok(None),
        [flag, path] if flag == "-f" => Ok(Some(path.clone())),
        _ => bail!("usage: add_package [-f CSV_FILE]"),
    }
}

/// Validates every row before ingesting any of them: a malformed row in a
/// CSV file fails the whole batch, rather than being silently skipped the
/// way a malformed stdin line is.
fn read_rows_from_csv(path: &str) -> Result<Vec<(String, String, String)>> {
    if !std::path::Path::new(path).is_file() {
        return Err(StoreError::FileMissing(path.to_string()).into());
    }

    let raw_rows = read_csv_records(path)?;
    for row in &raw_rows {
        if row.len() != 3 || (row[0] != "data" && row[0] != "file") {
            return Err(StoreError::InvalidCsv(path.to_string()).into());
        }
    }

    Ok(raw_rows.into_iter().map(|r| (r[0].clone(), r[1].clone(), r[2].clone())).collect())
}

fn read_csv_records(path: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading csv file {path}"))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading csv file {path}"))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Lines that don't split into exactly three comma-separated fields, or
/// whose first field isn't `data`/`file`, are skipped without comment.
fn read_rows_from_stdin() -> Vec<(String, String, String)> {
    let stdin = io::stdin();
    let mut rows = Vec::new();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { continue };
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            continue;
        }
        if fields[0] != "data" && fields[0] != "file" {
            continue;
        }
        rows.push((fields[0].to_string(), fields[1].to_string(), fields[2].to_string()));
    }
    rows
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        Value::File(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Destructures `rest` into a fixed-size array, or fails with a usage
/// message naming the expected shape.
fn require_args<'a, const N: usize>(rest: &'a [String], usage: &str) -> Result<[&'a str; N]> {
    if rest.len() != N {
        bail!("usage: kvimage {usage}");
    }
    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(rest.iter()) {
        *slot = arg.as_str();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_then_add_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.kvimg");
        let path = path.to_str().unwrap();

        init(path).unwrap();
        add(path, &["k".to_string(), "v".to_string()]).unwrap();
        assert_eq!(get(path, &["k".to_string()]).unwrap(), "v");
    }

    #[test]
    fn contains_reports_both_outcomes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.kvimg");
        let path = path.to_str().unwrap();

        init(path).unwrap();
        add(path, &["k".to_string(), "v".to_string()]).unwrap();
        assert!(contains(path, &["k".to_string()]).unwrap().contains("contains item"));
        assert!(contains(path, &["nope".to_string()]).unwrap().contains("doesn't contain"));
    }

    #[test]
    fn change_requires_a_recognized_value_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.kvimg");
        let path = path.to_str().unwrap();

        init(path).unwrap();
        add(path, &["k".to_string(), "v".to_string()]).unwrap();
        let err = change(path, &["k".to_string(), "bogus".to_string(), "v2".to_string()]).unwrap_err();
        assert!(err.to_string().contains("value_type"));
    }

    #[test]
    fn add_package_from_csv_rejects_a_malformed_row_entirely() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.kvimg");
        let path = path.to_str().unwrap();
        init(path).unwrap();

        let csv_path = dir.path().join("rows.csv");
        std::fs::write(&csv_path, "data,a,1\nbad,row\n").unwrap();

        let err = add_package(path, &["-f".to_string(), csv_path.to_str().unwrap().to_string()])
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::InvalidCsv(_))));
    }

    #[test]
    fn add_package_from_csv_ingests_data_and_file_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.kvimg");
        let path = path.to_str().unwrap();
        init(path).unwrap();

        let payload = dir.path().join("payload.bin");
        std::fs::write(&payload, b"bytes").unwrap();
        let csv_path = dir.path().join("rows.csv");
        std::fs::write(
            &csv_path,
            format!("data,a,1\nfile,b,{}\n", payload.to_str().unwrap()),
        )
        .unwrap();

        add_package(path, &["-f".to_string(), csv_path.to_str().unwrap().to_string()]).unwrap();
        assert_eq!(get(path, &["a".to_string()]).unwrap(), "1");
        assert!(contains(path, &["b".to_string()]).unwrap().contains("contains item"));
    }
}

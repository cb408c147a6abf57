use std::{fs, io, path::Path};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FixtureError;

use super::model::{SearchCase, UserRow};

pub const USERS_FILE: &str = "users.csv";
pub const PRODUCTS_FILE: &str = "products.json";
pub const SEARCH_CASES_FILE: &str = "search_products.json";

fn read_fixture(path: &Path) -> Result<String, FixtureError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => FixtureError::NotFound {
            path: path.to_path_buf(),
        },
        _ => FixtureError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path) -> Result<T, FixtureError> {
    let contents = read_fixture(path)?;
    serde_json::from_str(&contents).map_err(|source| FixtureError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Rows in file order, one map per row keyed by the header line.
pub fn load_users_csv(path: &Path) -> Result<Vec<UserRow>, FixtureError> {
    let contents = read_fixture(path)?;
    let csv_error = |source: csv::Error| FixtureError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row: UserRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

pub fn load_json_file(path: &Path) -> Result<Value, FixtureError> {
    parse_json(path)
}

pub fn load_products_data(data_dir: &Path) -> Result<Value, FixtureError> {
    load_json_file(&data_dir.join(PRODUCTS_FILE))
}

pub fn load_search_cases(path: &Path) -> Result<Vec<SearchCase>, FixtureError> {
    parse_json(path)
}

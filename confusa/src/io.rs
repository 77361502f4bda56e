use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use libconfusa::structs::{Form, Plat, Row};

use crate::extension_traits::PathBufExt;

/// Read a plat: a delimited table with a header row (skipped) and one
/// row per microclass, the first cell of each being its label.
pub fn read_plat<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Plat> {
    let file = File::open(path.as_ref()).context(format!(
        "failed to open plat file: {}",
        path.as_ref().to_string_lossy()
    ))?;
    let reader = BufReader::new(file);

    let mut rows: Vec<Row> = vec![];
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read plat line")?;
        let line = line.trim_end_matches('\r');

        if line_idx == 0 {
            // the header row carries column names, not forms
            continue;
        }
        if line.is_empty() {
            continue;
        }

        rows.push(Row::new(line.split(delimiter).map(Form::new).collect()));
    }

    Plat::new(rows)
}

pub fn write_json<T: Serialize>(path: &PathBuf, value: &T, allow_overwrite: bool) -> Result<()> {
    let mut writer = path.open(allow_overwrite)?;
    serde_json::to_writer(&mut writer, value).context(format!(
        "failed to write output file: {}",
        path.to_string_lossy()
    ))?;
    writeln!(writer)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let file = File::open(path).context(format!(
        "failed to open input file: {}",
        path.to_string_lossy()
    ))?;
    serde_json::from_reader(BufReader::new(file)).context(format!(
        "failed to parse input file: {}",
        path.to_string_lossy()
    ))
}

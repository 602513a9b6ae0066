//! On-disk matrix format
//!
//! Every artifact is a plain-text matrix so runs can be inspected with any
//! tool. The first line is a versioned header:
//!
//! ```text
//! # gauss-bbo matrix v1 <rows> <cols>
//! ```
//!
//! followed by one whitespace-separated line per row. Values are written in
//! shortest round-trip exponent form, so reading a file back reproduces the
//! exact `f64` values.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{DMatrix, DVector};

use crate::error::PersistenceError;

/// Current matrix format version
pub const FORMAT_VERSION: u32 = 1;

const HEADER_PREFIX: &str = "# gauss-bbo matrix";

/// Write a matrix, replacing any existing file
pub fn write_matrix(path: impl AsRef<Path>, matrix: &DMatrix<f64>) -> Result<(), PersistenceError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "{} v{} {} {}",
        HEADER_PREFIX,
        FORMAT_VERSION,
        matrix.nrows(),
        matrix.ncols()
    )?;
    for row in matrix.row_iter() {
        let line: Vec<String> = row.iter().map(|v| format!("{:e}", v)).collect();
        writeln!(writer, "{}", line.join(" "))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a vector as a single-row matrix
pub fn write_vector(path: impl AsRef<Path>, vector: &DVector<f64>) -> Result<(), PersistenceError> {
    write_matrix(path, &DMatrix::from_row_slice(1, vector.len(), vector.as_slice()))
}

/// Write a scalar as a 1x1 matrix
pub fn write_scalar(path: impl AsRef<Path>, value: f64) -> Result<(), PersistenceError> {
    write_matrix(path, &DMatrix::from_element(1, 1, value))
}

/// Read a matrix written by [`write_matrix`]
pub fn read_matrix(path: impl AsRef<Path>) -> Result<DMatrix<f64>, PersistenceError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PersistenceError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let parse_error = |message: String| PersistenceError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut lines = contents.lines();
    let header = lines
        .next()
        .ok_or_else(|| parse_error("empty file".to_string()))?;
    let (rows, cols) = parse_header(header).map_err(|e| match e {
        HeaderError::Version(found) => PersistenceError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        },
        HeaderError::Malformed(message) => parse_error(message),
    })?;

    let mut values = Vec::new();
    let mut n_rows = 0;
    for line in lines.filter(|l| !l.trim().is_empty()) {
        let row: Vec<f64> = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("invalid value '{}': {}", token, e)))
            })
            .collect::<Result<_, _>>()?;
        if row.len() != cols {
            return Err(parse_error(format!(
                "row {} has {} values, expected {}",
                n_rows,
                row.len(),
                cols
            )));
        }
        values.extend(row);
        n_rows += 1;
    }

    if n_rows != rows {
        return Err(parse_error(format!(
            "found {} rows, header declares {}",
            n_rows, rows
        )));
    }

    Ok(DMatrix::from_row_slice(rows, cols, &values))
}

/// Read a vector stored as a single row or a single column
pub fn read_vector(path: impl AsRef<Path>) -> Result<DVector<f64>, PersistenceError> {
    let path = path.as_ref();
    let matrix = read_matrix(path)?;
    if matrix.nrows() == 1 {
        Ok(DVector::from_iterator(matrix.ncols(), matrix.iter().copied()))
    } else if matrix.ncols() == 1 {
        Ok(matrix.column(0).into_owned())
    } else {
        Err(PersistenceError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "expected a vector, found a {}x{} matrix",
                matrix.nrows(),
                matrix.ncols()
            ),
        })
    }
}

/// Read a scalar stored as a 1x1 matrix
pub fn read_scalar(path: impl AsRef<Path>) -> Result<f64, PersistenceError> {
    let path = path.as_ref();
    let matrix = read_matrix(path)?;
    if matrix.shape() != (1, 1) {
        return Err(PersistenceError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "expected a scalar, found a {}x{} matrix",
                matrix.nrows(),
                matrix.ncols()
            ),
        });
    }
    Ok(matrix[(0, 0)])
}

enum HeaderError {
    Version(u32),
    Malformed(String),
}

fn parse_header(header: &str) -> Result<(usize, usize), HeaderError> {
    let rest = header
        .strip_prefix(HEADER_PREFIX)
        .ok_or_else(|| HeaderError::Malformed(format!("missing header, found '{}'", header)))?;

    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(HeaderError::Malformed(format!("malformed header '{}'", header)));
    }

    let version = fields[0]
        .strip_prefix('v')
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| HeaderError::Malformed(format!("invalid version '{}'", fields[0])))?;
    if version != FORMAT_VERSION {
        return Err(HeaderError::Version(version));
    }

    let rows = fields[1]
        .parse::<usize>()
        .map_err(|_| HeaderError::Malformed(format!("invalid row count '{}'", fields[1])))?;
    let cols = fields[2]
        .parse::<usize>()
        .map_err(|_| HeaderError::Malformed(format!("invalid column count '{}'", fields[2])))?;
    if rows.checked_mul(cols).is_none() {
        return Err(HeaderError::Malformed(format!(
            "matrix size {}x{} overflows",
            rows, cols
        )));
    }

    Ok((rows, cols))
}

//! Measurement logs written by the renderer during timing runs.
//!
//! A log is tab separated text with an 8 line header and a 3 line trailer.
//! Each body line holds:
//!
//! ```text
//! system_time  elapsed_ms  kernel_time  (mouse_x, mouse_y)  (grid_x, grid_y)  flag
//! ```

use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

pub const HEADER_LINES: usize = 8;
pub const TRAILER_LINES: usize = 3;

#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("failed to read measurement log: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("log has {0} lines, fewer than header and trailer combined")]
    TooShort(usize),
}

/// One timing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    system_time: String,
    elapsed_time: i64,
    kernel_time: f64,
    mouse_position: (i32, i32),
    grid_position: (i32, i32),
    single_measurement: bool,
}

impl Measurement {
    pub fn system_time(&self) -> &str {
        &self.system_time
    }

    pub fn elapsed_time(&self) -> i64 {
        self.elapsed_time
    }

    pub fn kernel_time(&self) -> f64 {
        self.kernel_time
    }

    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse_position
    }

    pub fn grid_position(&self) -> (i32, i32) {
        self.grid_position
    }

    /// False for samples the renderer repeated at the same position.
    pub fn single_measurement(&self) -> bool {
        self.single_measurement
    }
}

/// Parse a `(a, b)` tuple of integers.
fn parse_pair(s: &str) -> Result<(i32, i32), String> {
    let inner = s
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("expected (a, b), got '{}'", s.trim()))?;
    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("expected two components in '{}'", s.trim()));
    }
    let a = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("not an integer: {}", parts[0].trim()))?;
    let b = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("not an integer: {}", parts[1].trim()))?;
    Ok((a, b))
}

fn parse_line(line: &str) -> Result<Measurement, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(format!("expected 6 tab separated fields, got {}", fields.len()));
    }
    let elapsed_time = fields[1]
        .trim()
        .parse()
        .map_err(|_| format!("invalid elapsed time: {}", fields[1].trim()))?;
    let kernel_time = fields[2]
        .trim()
        .parse()
        .map_err(|_| format!("invalid kernel time: {}", fields[2].trim()))?;
    let mouse_position = parse_pair(fields[3])?;
    let grid_position = parse_pair(fields[4])?;
    let flag: i64 = fields[5]
        .trim()
        .parse()
        .map_err(|_| format!("invalid measurement flag: {}", fields[5].trim()))?;

    Ok(Measurement {
        system_time: fields[0].to_string(),
        elapsed_time,
        kernel_time,
        mouse_position,
        grid_position,
        single_measurement: flag != 1,
    })
}

/// Parse the contents of a measurement log.
pub fn parse(content: &str) -> Result<Vec<Measurement>, MeasurementError> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < HEADER_LINES + TRAILER_LINES {
        return Err(MeasurementError::TooShort(lines.len()));
    }

    let body = &lines[HEADER_LINES..lines.len() - TRAILER_LINES];
    let mut measurements = Vec::with_capacity(body.len());
    for (i, line) in body.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let measurement = parse_line(line).map_err(|reason| MeasurementError::Parse {
            line: HEADER_LINES + i + 1,
            reason,
        })?;
        measurements.push(measurement);
    }
    Ok(measurements)
}

pub fn read(path: &Path) -> Result<Vec<Measurement>, MeasurementError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Mouse x, mouse y and kernel time as parallel sequences.
pub fn axes(measurements: &[Measurement]) -> (Vec<i32>, Vec<i32>, Vec<f64>) {
    let xs = measurements.iter().map(|m| m.mouse_position.0).collect();
    let ys = measurements.iter().map(|m| m.mouse_position.1).collect();
    let ts = measurements.iter().map(|m| m.kernel_time).collect();
    (xs, ys, ts)
}

/// Print the three [`axes`] sequences, one whitespace separated line each.
pub fn write_axes(measurements: &[Measurement], out: &mut impl Write) -> io::Result<()> {
    let (xs, ys, ts) = axes(measurements);
    let line = |values: Vec<String>| values.join(" ");
    writeln!(out, "{}", line(xs.iter().map(|x| x.to_string()).collect()))?;
    writeln!(out, "{}", line(ys.iter().map(|y| y.to_string()).collect()))?;
    writeln!(out, "{}", line(ts.iter().map(|t| t.to_string()).collect()))?;
    Ok(())
}

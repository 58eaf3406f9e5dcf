use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::problem::pdptw::PDPTWInstance;

pub mod li_lim_reader;
pub mod sartori_buriol_reader;
pub mod sintef_solution;

/// Loads either supported instance format, telling them apart by the first
/// line: keyword headers (`NAME:`/`SIZE:`) mean the Sartori-Buriol layout,
/// a bare integer triple means the Li-Lim layout.
pub fn load_instance(path: impl AsRef<Path>) -> Result<PDPTWInstance> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|it| it.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string());

    let f = File::open(path).with_context(|| format!("opening instance {}", path.display()))?;
    let mut reader = BufReader::new(f);

    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;

    if is_keyword_header(&first_line) {
        sartori_buriol_reader::parse_instance(&first_line, reader, name)
    } else if is_integer_header(&first_line) {
        li_lim_reader::parse_instance(&first_line, reader, name)
    } else {
        bail!(
            "unrecognized instance header: {:?}",
            first_line.trim_end()
        );
    }
}

fn is_keyword_header(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper.contains("SIZE") || upper.contains("NAME") || upper.contains("CAPACITY")
}

fn is_integer_header(line: &str) -> bool {
    let mut fields = line.split_whitespace();
    let parsed = fields.next().map(|f| f.parse::<i64>().is_ok()).unwrap_or(false)
        && fields.next().map(|f| f.parse::<i64>().is_ok()).unwrap_or(false);
    parsed
}

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::problem::pdptw::PDPTWInstance;
use crate::solution::Solution;

/**
Solution layout shared by the SINTEF TOP site and the Sartori & Buriol data
set:

```text
Instance name : <name>
Authors       : <free text>
Date          : <yyyy-mm-dd>
Reference     : <free text>
Solution
Route 1 : n1 n2 n3 ...
Route 2 : ...
```

Routes are 1-indexed and list only the non-depot nodes; the depot endpoints
are implicit.
 */
pub struct SINTEFSolution {
    pub instance_name: String,
    pub authors: String,
    pub date_string: String,
    pub reference: String,
    pub routes: Vec<Vec<usize>>,
}

pub fn load_sintef_solution(path: impl AsRef<Path>) -> Result<SINTEFSolution> {
    let f = File::open(path.as_ref())
        .with_context(|| format!("opening solution {}", path.as_ref().display()))?;
    let reader = BufReader::new(f);
    parse_sintef_solution(reader)
}

pub fn parse_sintef_solution(reader: impl BufRead) -> Result<SINTEFSolution> {
    let mut lines = reader.lines();

    let mut next_value = |what: &str| -> Result<String> {
        let line = lines
            .next()
            .with_context(|| format!("missing header line {}", what))??;
        let (_, value) = line
            .split_once(':')
            .with_context(|| format!("malformed header line {:?}", line))?;
        Ok(value.trim().to_string())
    };

    let instance_name = next_value("Instance name")?;
    let authors = next_value("Authors")?;
    let date_string = next_value("Date")?;
    let reference = next_value("Reference")?;

    // the "Solution" marker
    lines.next().context("missing Solution marker")??;

    let mut routes = Vec::new();
    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (_, itinerary) = trimmed
            .split_once(':')
            .with_context(|| format!("malformed route line {:?}", trimmed))?;
        let route = itinerary
            .split_whitespace()
            .map(|id| id.parse::<usize>().context("route node id"))
            .collect::<Result<Vec<usize>>>()?;
        routes.push(route);
    }

    Ok(SINTEFSolution {
        instance_name,
        authors,
        date_string,
        reference,
        routes,
    })
}

/// Rebuilds a working solution from a parsed file; node ids in the file are
/// instance node ids.
pub fn create_solution_from_sintef<'a>(
    sintef: &SINTEFSolution,
    instance: &'a PDPTWInstance,
) -> Solution<'a> {
    Solution::from_routes(instance, sintef.routes.clone())
}

pub struct SINTEFSolutionBuilder {
    pub instance_name: Option<String>,
    pub authors: Option<String>,
    pub date_string: Option<String>,
    pub reference: Option<String>,
    pub routes: Vec<Vec<usize>>,
}

impl SINTEFSolutionBuilder {
    pub fn new() -> Self {
        Self {
            instance_name: None,
            authors: None,
            date_string: None,
            reference: None,
            routes: vec![],
        }
    }

    pub fn instance_name(&mut self, instance_name: impl Into<String>) -> &mut Self {
        self.instance_name = Some(instance_name.into());
        self
    }

    pub fn authors(&mut self, authors: impl Into<String>) -> &mut Self {
        self.authors = Some(authors.into());
        self
    }

    pub fn date_string(&mut self, date_string: impl Into<String>) -> &mut Self {
        self.date_string = Some(date_string.into());
        self
    }

    pub fn reference(&mut self, reference: impl Into<String>) -> &mut Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn routes(&mut self, routes: Vec<Vec<usize>>) -> &mut Self {
        self.routes = routes;
        self
    }

    pub fn routes_from_solution(&mut self, solution: &Solution) -> &mut Self {
        self.routes = solution.to_routes_vec();
        self
    }

    pub fn build(self) -> SINTEFSolution {
        SINTEFSolution {
            instance_name: self.instance_name.unwrap_or_else(|| "UNKNOWN".to_string()),
            authors: self.authors.unwrap_or_else(|| "pdptw-ils".to_string()),
            date_string: self
                .date_string
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            reference: self
                .reference
                .unwrap_or_else(|| "ILS/LNS heuristic solver".to_string()),
            routes: self.routes,
        }
    }
}

pub fn write_sintef_solution(path: impl AsRef<Path>, solution: &SINTEFSolution) -> Result<()> {
    let f = File::create(path.as_ref())
        .with_context(|| format!("creating solution file {}", path.as_ref().display()))?;
    let mut file = BufWriter::new(&f);
    write_sintef_solution_to(&mut file, solution)
}

pub fn write_sintef_solution_to(writer: &mut impl Write, solution: &SINTEFSolution) -> Result<()> {
    writeln!(writer, "Instance name : {}", solution.instance_name)?;
    writeln!(writer, "Authors       : {}", solution.authors)?;
    writeln!(writer, "Date          : {}", solution.date_string)?;
    writeln!(writer, "Reference     : {}", solution.reference)?;
    writeln!(writer, "Solution")?;

    for (idx, route) in solution.routes.iter().filter(|r| !r.is_empty()).enumerate() {
        write!(writer, "Route {} :", idx + 1)?;
        for node in route {
            write!(writer, " {}", node)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::pdptw::tests::instance_with_pairs;
    use crate::utils::validator::validate_solution;
    use std::io::Cursor;

    fn sample() -> SINTEFSolution {
        let mut builder = SINTEFSolutionBuilder::new();
        builder
            .instance_name("tiny-1")
            .authors("nobody")
            .date_string("2024-06-01")
            .reference("unit test")
            .routes(vec![vec![1, 2], vec![3, 4]]);
        builder.build()
    }

    #[test]
    fn writes_the_expected_layout() {
        let mut buffer = Vec::new();
        write_sintef_solution_to(&mut buffer, &sample()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let expected = "\
Instance name : tiny-1
Authors       : nobody
Date          : 2024-06-01
Reference     : unit test
Solution
Route 1 : 1 2
Route 2 : 3 4
";
        assert_eq!(text, expected);
    }

    #[test]
    fn round_trips_through_parse() {
        let mut buffer = Vec::new();
        write_sintef_solution_to(&mut buffer, &sample()).unwrap();
        let parsed = parse_sintef_solution(Cursor::new(buffer)).unwrap();
        assert_eq!(parsed.instance_name, "tiny-1");
        assert_eq!(parsed.routes, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn round_trip_preserves_vehicles_and_distance() {
        let instance = instance_with_pairs(
            4,
            10_000.0,
            &[
                ((10.0, 0.0, 0.0, 5000.0), (20.0, 0.0, 0.0, 10_000.0)),
                ((10.0, 5.0, 0.0, 5000.0), (20.0, 5.0, 0.0, 10_000.0)),
            ],
        );
        let solution = Solution::from_routes(&instance, vec![vec![1, 2], vec![3, 4]]);

        let mut builder = SINTEFSolutionBuilder::new();
        builder
            .instance_name("roundtrip")
            .routes_from_solution(&solution);
        let mut buffer = Vec::new();
        write_sintef_solution_to(&mut buffer, &builder.build()).unwrap();

        let parsed = parse_sintef_solution(Cursor::new(buffer)).unwrap();
        let rebuilt = create_solution_from_sintef(&parsed, &instance);
        assert_eq!(rebuilt.vehicle_count(), solution.vehicle_count());
        assert_eq!(rebuilt.total_cost(), solution.total_cost());
        assert!(validate_solution(&instance, &rebuilt).is_feasible());
    }
}

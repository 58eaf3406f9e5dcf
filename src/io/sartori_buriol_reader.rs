use std::io::BufRead;

use anyhow::{bail, Context, Result};

use crate::problem::pdptw::{create_instance_with, Capacity, Node, NodeType, PDPTWInstance};
use crate::problem::travel_matrix::FixSizedTravelMatrixBuilder;
use crate::problem::Arc;

/**
Keyword-based layout from the Sartori & Buriol data set
(https://data.mendeley.com/datasets/wr2ct4r22f/2):

```text
NAME: bar-n100-1
...
SIZE: 101
CAPACITY: 200
...
NODES
<id> <lat> <lon> <demand> <etw> <ltw> <dur> <p> <d>
...
EDGES
<full travel time matrix, one row per node>
```

The pair columns name the sibling task; travel times are given explicitly and
double as distances.
 */
pub(crate) fn parse_instance(
    first_line: &str,
    mut reader: impl BufRead,
    fallback_name: String,
) -> Result<PDPTWInstance> {
    let mut name = fallback_name;
    let mut size: Option<usize> = None;
    let mut capacity: Option<Capacity> = None;

    let mut apply_header_field = |line: &str, name: &mut String| -> Result<()> {
        let mut fields = line.split_whitespace();
        let Some(key) = fields.next() else {
            return Ok(());
        };
        let value = fields.collect::<Vec<_>>().join(" ");
        match key.trim_end_matches(':').to_uppercase().as_str() {
            "NAME" => *name = value,
            "SIZE" => size = Some(value.parse().context("SIZE")?),
            "CAPACITY" => capacity = Some(value.parse().context("CAPACITY")?),
            // LOCATION, DISTRIBUTION, DEPOT, ROUTE-TIME, TIME-WINDOW and
            // friends do not affect the solver
            _ => {}
        }
        Ok(())
    };

    apply_header_field(first_line, &mut name)?;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            bail!("unexpected end of file before NODES section");
        }
        if line.trim() == "NODES" {
            break;
        }
        apply_header_field(&line, &mut name)?;
    }

    let size = size.context("header is missing SIZE")?;
    let capacity = capacity.context("header is missing CAPACITY")?;

    let nodes = read_nodes(&mut reader, size)?;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            bail!("unexpected end of file before EDGES section");
        }
        if line.trim() == "EDGES" {
            break;
        }
        if !line.trim().is_empty() {
            bail!("unexpected content between NODES and EDGES: {:?}", line.trim());
        }
    }

    let travel_matrix = read_edges(&mut reader, size)?;

    create_instance_with(name, capacity, nodes, travel_matrix)
}

fn read_nodes(reader: &mut impl BufRead, size: usize) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(size);
    let mut line = String::new();
    while nodes.len() < size {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            bail!("NODES section ended after {} of {} nodes", nodes.len(), size);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 7 {
            bail!("node line has {} fields, expected at least 7", fields.len());
        }
        let id: usize = fields[0].parse()?;
        let y: f64 = fields[1].parse()?; // latitude
        let x: f64 = fields[2].parse()?; // longitude
        let demand: Capacity = fields[3].parse()?;
        let ready: f64 = fields[4].parse()?;
        let due: f64 = fields[5].parse()?;
        let servicetime: f64 = fields[6].parse()?;
        let p: usize = if fields.len() > 7 { fields[7].parse()? } else { 0 };
        let d: usize = if fields.len() > 8 { fields[8].parse()? } else { 0 };

        let (node_type, pair) = if id == 0 {
            (NodeType::Depot, 0)
        } else if demand > 0 {
            // pair columns may be absent; the data set then pairs node i with
            // node i + (size / 2)
            (NodeType::Pickup, if d > 0 { d } else { id + size / 2 })
        } else {
            (NodeType::Delivery, if p > 0 { p } else { id.saturating_sub(size / 2) })
        };

        nodes.push(Node {
            id,
            node_type,
            x,
            y,
            demand,
            ready,
            due,
            servicetime,
            pair,
        });
    }
    Ok(nodes)
}

fn read_edges(
    reader: &mut impl BufRead,
    size: usize,
) -> Result<crate::problem::travel_matrix::FixSizedTravelMatrix> {
    let mut builder = FixSizedTravelMatrixBuilder::with_num_nodes(size);
    let mut line = String::new();
    let mut row = 0usize;
    while row < size {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            bail!("EDGES section ended after {} of {} rows", row, size);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let values: Vec<f64> = trimmed
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("EDGES row {}", row))?;
        if values.len() != size {
            bail!("EDGES row {} has {} entries, expected {}", row, values.len(), size);
        }
        for (to, &value) in values.iter().enumerate() {
            builder.set_arc(Arc {
                from: row,
                to,
                distance: value,
                time: value,
            });
        }
        row += 1;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TINY: &str = "\
LOCATION: nowhere
SIZE: 3
CAPACITY: 5
NODES
0 0.0 0.0 0 0 1000 0 0 0
1 0.0 10.0 1 0 500 0 0 2
2 0.0 20.0 -1 0 1000 0 1 0
EDGES
0 10 20
10 0 10
20 10 0
";

    #[test]
    fn parses_keyword_instance_with_explicit_matrix() {
        let instance = parse_instance(
            "NAME: tiny-1\n",
            Cursor::new(TINY),
            "fallback".to_string(),
        )
        .unwrap();
        assert_eq!(instance.name, "tiny-1");
        assert_eq!(instance.num_requests, 1);
        assert_eq!(instance.capacity, 5);
        assert_eq!(instance.distance(0, 2), 20.0);
        assert_eq!(instance.time(1, 2), 10.0);
    }

    #[test]
    fn rejects_asymmetric_matrices() {
        let broken = TINY.replace("10 0 10", "11 0 10");
        let res = parse_instance("NAME: tiny-1\n", Cursor::new(broken), "x".to_string());
        assert!(res.is_err());
    }

    #[test]
    fn rejects_truncated_edges() {
        let truncated = TINY.rsplit_once('\n').map(|(head, _)| head.to_string()).unwrap();
        let truncated = truncated.rsplit_once('\n').map(|(head, _)| head.to_string()).unwrap();
        let res = parse_instance("NAME: tiny-1\n", Cursor::new(truncated), "x".to_string());
        assert!(res.is_err());
    }
}

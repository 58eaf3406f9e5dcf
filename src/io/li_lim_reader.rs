use std::io::BufRead;

use anyhow::{bail, Context, Result};

use crate::problem::pdptw::{create_instance_with, Capacity, Node, NodeType, PDPTWInstance};
use crate::problem::travel_matrix::FixSizedTravelMatrix;

/**
From https://www.sintef.no/projectweb/top/pdptw/documentation/

----------

First line: NUMBER OF VEHICLES  VEHICLE CAPACITY  SPEED
Each further line:

TASK NO.  X  Y  DEMAND  EARLIEST  LATEST  SERVICE  PICKUP  DELIVERY

Task 0 is the depot. For pickup tasks the PICKUP column is 0 and DELIVERY
names the sibling; for delivery tasks PICKUP names the sibling. Travel time
equals distance (speed 1) unless the header says otherwise.
 */
pub(crate) fn parse_instance(
    first_line: &str,
    reader: impl BufRead,
    name: String,
) -> Result<PDPTWInstance> {
    let (capacity, speed) = read_properties(first_line)?;
    let io_nodes = read_nodes(reader)?;
    if io_nodes.is_empty() {
        bail!("instance contains no nodes");
    }

    let nodes = transform_to_pdptw_nodes(&io_nodes)?;
    let coords: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x, n.y)).collect();
    let travel_matrix = FixSizedTravelMatrix::with_euclidean_distances(&coords, speed);

    create_instance_with(name, capacity, nodes, travel_matrix)
}

fn read_properties(line: &str) -> Result<(Capacity, f64)> {
    let mut split = line.split_whitespace();
    let _num_vehicles: usize = split
        .next()
        .context("missing vehicle count")?
        .parse()
        .context("vehicle count")?;
    let capacity: Capacity = split
        .next()
        .context("missing capacity")?
        .parse()
        .context("capacity")?;
    let speed: f64 = match split.next() {
        Some(field) => field.parse().context("speed")?,
        None => 1.0,
    };
    Ok((capacity, if speed > 0.0 { speed } else { 1.0 }))
}

#[derive(Debug)]
struct IONode {
    id: usize,
    x: f64,
    y: f64,
    demand: Capacity,
    earliest: f64,
    latest: f64,
    service: f64,
    p: usize,
    d: usize,
}

fn read_nodes(reader: impl BufRead) -> Result<Vec<IONode>> {
    let mut nodes = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut split = line.split_whitespace();
        let mut next = |what: &str| {
            split
                .next()
                .with_context(|| format!("node line missing field {}", what))
        };
        let id: usize = next("id")?.parse()?;
        let x: f64 = next("x")?.parse()?;
        let y: f64 = next("y")?.parse()?;
        let demand: Capacity = next("demand")?.parse()?;
        let earliest: f64 = next("earliest")?.parse()?;
        let latest: f64 = next("latest")?.parse()?;
        let service: f64 = next("service")?.parse()?;
        let p: usize = next("pickup sibling")?.parse()?;
        let d: usize = next("delivery sibling")?.parse()?;
        nodes.push(IONode {
            id,
            x,
            y,
            demand,
            earliest,
            latest,
            service,
            p,
            d,
        });
    }
    Ok(nodes)
}

fn transform_to_pdptw_nodes(io_nodes: &[IONode]) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(io_nodes.len());
    for io_node in io_nodes {
        if io_node.id != nodes.len() {
            bail!(
                "node ids must be consecutive, expected {} got {}",
                nodes.len(),
                io_node.id
            );
        }
        let (node_type, pair) = if io_node.id == 0 {
            (NodeType::Depot, 0)
        } else if io_node.p == 0 {
            (NodeType::Pickup, io_node.d)
        } else {
            (NodeType::Delivery, io_node.p)
        };
        nodes.push(Node {
            id: io_node.id,
            node_type,
            x: io_node.x,
            y: io_node.y,
            demand: io_node.demand,
            ready: io_node.earliest,
            due: io_node.latest,
            servicetime: io_node.service,
            pair,
        });
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_a_minimal_instance() {
        let header = "2 200 1\n";
        let body = "0\t0\t0\t0\t0\t1000\t0\t0\t0\n1\t10\t0\t1\t0\t500\t0\t0\t2\n2\t20\t0\t-1\t0\t1000\t0\t1\t0\n";
        let instance =
            parse_instance(header, Cursor::new(body), "tiny".to_string()).unwrap();
        assert_eq!(instance.num_requests, 1);
        assert_eq!(instance.capacity, 200);
        assert_eq!(instance.delivery_of(1), 2);
        assert_eq!(instance.distance(0, 1), 10.0);
        assert_eq!(instance.distance(1, 2), 10.0);
    }

    #[test]
    fn speed_factor_divides_travel_times() {
        let header = "2 200 2\n";
        let body = "0\t0\t0\t0\t0\t1000\t0\t0\t0\n1\t10\t0\t1\t0\t500\t0\t0\t2\n2\t20\t0\t-1\t0\t1000\t0\t1\t0\n";
        let instance = parse_instance(header, Cursor::new(body), "speedy".to_string()).unwrap();
        assert_eq!(instance.distance(0, 1), 10.0);
        assert_eq!(instance.time(0, 1), 5.0);
    }

    #[test]
    fn rejects_gapped_ids() {
        let header = "1 10 1\n";
        let body = "0\t0\t0\t0\t0\t100\t0\t0\t0\n2\t5\t0\t1\t0\t100\t0\t0\t3\n";
        assert!(parse_instance(header, Cursor::new(body), "bad".to_string()).is_err());
    }
}

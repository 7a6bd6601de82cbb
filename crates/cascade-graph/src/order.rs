use std::collections::{BTreeSet, HashMap};

use cascade_core::{CascadeError, CascadeResult};

use crate::types::{PackageGraph, ROOT_ID};

/// Orders the graph so every dependency precedes its dependents.
///
/// Kahn's algorithm: nodes whose in-degree is zero are emitted one at a
/// time. When several are ready, the one discovered first goes first. If the
/// algorithm stalls, every node still holding a positive in-degree is
/// reported as part of the cycle, in discovery order.
pub fn schedule(graph: &PackageGraph) -> CascadeResult<Vec<String>> {
    if graph.edges.is_empty() {
        return Ok(vec![ROOT_ID.to_string()]);
    }

    let position: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect();
    let mut in_degree = vec![0_usize; graph.nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];

    for edge in &graph.edges {
        let (Some(&from), Some(&to)) = (
            position.get(edge.dependency.as_str()),
            position.get(edge.dependent.as_str()),
        ) else {
            return Err(CascadeError::configuration(format!(
                "dependency edge '{}' -> '{}' references an undiscovered package",
                edge.dependency, edge.dependent
            )));
        };
        dependents[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter_map(|(index, degree)| (*degree == 0).then_some(index))
        .collect();
    let mut ordered = Vec::with_capacity(graph.nodes.len());

    while let Some(next) = ready.pop_first() {
        ordered.push(graph.nodes[next].id.clone());
        for &child in &dependents[next] {
            in_degree[child] = in_degree[child].saturating_sub(1);
            if in_degree[child] == 0 {
                ready.insert(child);
            }
        }
    }

    if ordered.len() != graph.nodes.len() {
        let nodes = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(index, _)| graph.nodes[index].id.clone())
            .collect();
        return Err(CascadeError::GraphCycle { nodes });
    }

    Ok(ordered)
}

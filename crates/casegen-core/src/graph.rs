use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Summary of the reference graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Dependency ordering of constraint ids, or the ids caught in a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceGraphReport {
    pub summary: ReferenceGraphSummary,
    pub order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic ordering report for constraint references.
///
/// `dependencies` maps each id to the ids it needs (references and wrapped
/// ids). Ids that only appear as dependencies are added as nodes.
pub fn build_reference_report(
    dependencies: &BTreeMap<String, BTreeSet<String>>,
) -> ReferenceGraphReport {
    let graph = build_adjacency(dependencies);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = ReferenceGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => ReferenceGraphReport {
            summary,
            order: Some(order),
            cycle: None,
        },
        Err(cycle) => ReferenceGraphReport {
            summary,
            order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(
    dependencies: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (node, needs) in dependencies {
        graph.entry(node.clone()).or_default();
        for needed in needs {
            graph
                .entry(needed.clone())
                .or_default()
                .insert(node.clone());
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then(|| node.clone()))
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect();
        Err(cycle_nodes)
    }
}

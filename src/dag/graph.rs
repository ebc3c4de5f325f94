// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Bfs, Reversed};
use petgraph::Direction;
use tracing::debug;

use crate::dag::unit::{UnitName, UnitSpec};
use crate::errors::ValidationError;

/// Internal node structure: immediate edges plus the precomputed closure used
/// by failure propagation.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct prerequisites, sorted and de-duplicated.
    deps: Vec<UnitName>,
    /// Direct dependents, sorted.
    dependents: Vec<UnitName>,
    /// Every unit that (directly or indirectly) requires this one.
    transitive_dependents: BTreeSet<UnitName>,
}

/// Validated, immutable dependency graph keyed by unit name.
///
/// Edges point from a dependent to its prerequisite. Once built the graph is
/// guaranteed to be acyclic and free of dangling references.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: BTreeMap<UnitName, DagNode>,
}

impl DagGraph {
    /// Validate the declared units and build the graph.
    ///
    /// Checks run in this order: duplicate names, unresolved prerequisites,
    /// cycles. The first problem found is returned.
    pub fn build(units: &[UnitSpec]) -> Result<Self, ValidationError> {
        let mut names: HashSet<&str> = HashSet::with_capacity(units.len());
        for unit in units {
            if !names.insert(unit.name.as_str()) {
                return Err(ValidationError::DuplicateUnit {
                    name: unit.name.clone(),
                });
            }
        }

        let mut sorted: Vec<&UnitSpec> = units.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        for unit in &sorted {
            for prereq in &unit.prerequisites {
                if !names.contains(prereq.as_str()) {
                    return Err(ValidationError::UnknownDependency {
                        unit: unit.name.clone(),
                        missing: prereq.clone(),
                    });
                }
            }
        }

        // Edge direction: dependent -> prerequisite.
        // For `Collection` depending on `Login` we add Collection -> Login.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for unit in &sorted {
            graph.add_node(unit.name.as_str());
        }
        for unit in &sorted {
            for prereq in &unit.prerequisites {
                graph.add_edge(unit.name.as_str(), prereq.as_str(), ());
            }
        }

        if let Some(cycle) = find_cycle(&graph) {
            return Err(ValidationError::CyclicDependency { cycle });
        }

        let mut nodes: BTreeMap<UnitName, DagNode> = BTreeMap::new();
        for unit in &sorted {
            nodes.insert(
                unit.name.clone(),
                DagNode {
                    deps: unit.prerequisites.iter().cloned().collect(),
                    ..DagNode::default()
                },
            );
        }

        for unit in &sorted {
            for prereq in &unit.prerequisites {
                if let Some(node) = nodes.get_mut(prereq) {
                    node.dependents.push(unit.name.clone());
                }
            }
        }

        // Walking the reversed graph from a node reaches everything that
        // depends on it. Computed once here and reused for every failure.
        let reversed = Reversed(&graph);
        for unit in &sorted {
            let start = unit.name.as_str();
            let mut bfs = Bfs::new(reversed, start);
            let mut reached = BTreeSet::new();
            while let Some(n) = bfs.next(reversed) {
                if n != start {
                    reached.insert(n.to_string());
                }
            }
            if let Some(node) = nodes.get_mut(start) {
                node.transitive_dependents = reached;
            }
        }

        debug!(
            units = nodes.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );

        Ok(Self { nodes })
    }

    /// Restrict the graph to `selected` units plus everything they transitively
    /// require.
    pub fn select<S: AsRef<str>>(&self, selected: &[S]) -> Result<Self, ValidationError> {
        let mut keep: BTreeSet<UnitName> = BTreeSet::new();
        for name in selected {
            let name = name.as_ref();
            if !self.contains(name) {
                return Err(ValidationError::UnknownUnit {
                    name: name.to_string(),
                });
            }
            keep.insert(name.to_string());
            keep.extend(self.transitive_prerequisites_of(name));
        }

        let specs: Vec<UnitSpec> = keep
            .iter()
            .map(|name| UnitSpec {
                name: name.clone(),
                prerequisites: self.dependencies_of(name).iter().cloned().collect(),
            })
            .collect();

        Self::build(&specs)
    }

    /// All unit names, in name order.
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Units with no prerequisites.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Immediate prerequisites of a unit.
    pub fn dependencies_of(&self, name: &str) -> &[UnitName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a unit.
    pub fn dependents_of(&self, name: &str) -> &[UnitName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Every unit that directly or indirectly requires `name`.
    pub fn transitive_dependents_of(&self, name: &str) -> Option<&BTreeSet<UnitName>> {
        self.nodes.get(name).map(|n| &n.transitive_dependents)
    }

    /// Every unit that `name` directly or indirectly requires.
    pub fn transitive_prerequisites_of(&self, name: &str) -> BTreeSet<UnitName> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = self.dependencies_of(name).iter().map(|s| s.as_str()).collect();

        while let Some(next) = stack.pop() {
            if seen.insert(next.to_string()) {
                stack.extend(self.dependencies_of(next).iter().map(|s| s.as_str()));
            }
        }

        seen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

struct Frame<'g> {
    node: &'g str,
    children: Vec<&'g str>,
    next: usize,
}

impl<'g> Frame<'g> {
    fn new(graph: &DiGraphMap<&'g str, ()>, node: &'g str) -> Self {
        let mut children: Vec<&str> = graph.neighbors_directed(node, Direction::Outgoing).collect();
        children.sort_unstable();
        Self {
            node,
            children,
            next: 0,
        }
    }
}

/// Depth-first search with an on-stack marker, started from every node in name
/// order so disconnected components are covered too.
///
/// Returns the cycle as `[a, b, ..., a]` following dependent -> prerequisite
/// edges.
fn find_cycle(graph: &DiGraphMap<&str, ()>) -> Option<Vec<UnitName>> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.node_count());
    let mut starts: Vec<&str> = graph.nodes().collect();
    starts.sort_unstable();

    for start in starts {
        if marks.contains_key(start) {
            continue;
        }

        marks.insert(start, Mark::OnStack);
        let mut frames = vec![Frame::new(graph, start)];

        while let Some(frame) = frames.last_mut() {
            if frame.next == frame.children.len() {
                marks.insert(frame.node, Mark::Done);
                frames.pop();
                continue;
            }

            let child = frame.children[frame.next];
            frame.next += 1;

            match marks.get(child).copied() {
                Some(Mark::OnStack) => {
                    let from = frames.iter().position(|f| f.node == child).unwrap_or(0);
                    let mut cycle: Vec<UnitName> =
                        frames[from..].iter().map(|f| f.node.to_string()).collect();
                    cycle.push(child.to_string());
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(child, Mark::OnStack);
                    frames.push(Frame::new(graph, child));
                }
            }
        }
    }

    None
}

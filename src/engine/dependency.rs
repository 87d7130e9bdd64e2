// ABOUTME: Dependency graph validation and execution planning
// ABOUTME: Rejects malformed graphs and derives a stable topological order plus parallel waves

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use super::error::{OrchestratorError, Result};
use super::task::TaskDescriptor;

/// Validated, acyclic dependency graph. Node indices follow declaration order.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: Graph<String, ()>,
    task_indices: HashMap<String, NodeIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Total order consistent with every dependency edge. Tasks with no
    /// relative constraint keep their declared order.
    pub order: Vec<String>,
    /// Tasks grouped by dependency depth; every dependency of a task lives in
    /// an earlier wave.
    pub waves: Vec<Vec<String>>,
    pub total_tasks: usize,
}

impl DependencyGraph {
    /// Build and validate the graph for a task list
    pub fn from_tasks(tasks: &[TaskDescriptor]) -> Result<Self> {
        if tasks.is_empty() {
            return Err(OrchestratorError::EmptyWorkflow);
        }

        let mut graph = Graph::new();
        let mut task_indices = HashMap::new();

        for task in tasks {
            if task_indices.contains_key(&task.id) {
                return Err(OrchestratorError::DuplicateTaskId {
                    task_id: task.id.clone(),
                });
            }
            let node_index = graph.add_node(task.id.clone());
            task_indices.insert(task.id.clone(), node_index);
        }

        // Edges run from dependency to dependent
        for task in tasks {
            let task_node = task_indices[&task.id];
            for dependency in &task.dependencies {
                match task_indices.get(dependency) {
                    Some(&dep_node) => {
                        graph.update_edge(dep_node, task_node, ());
                    }
                    None => {
                        return Err(OrchestratorError::UnknownDependency {
                            task: task.id.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                }
            }
        }

        let dependency_graph = Self {
            graph,
            task_indices,
        };
        dependency_graph.check_cycles()?;

        Ok(dependency_graph)
    }

    /// Report every task that sits on a cycle, in declaration order
    fn check_cycles(&self) -> Result<()> {
        let mut cyclic: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.graph.contains_edge(component[0], component[0])
            })
            .flatten()
            .collect();

        if cyclic.is_empty() {
            return Ok(());
        }

        cyclic.sort();
        Err(OrchestratorError::CycleDetected {
            tasks: cyclic
                .into_iter()
                .map(|node| self.graph[node].clone())
                .collect(),
        })
    }

    /// Create the execution plan: a stable topological order and its waves
    pub fn create_execution_plan(&self) -> ExecutionPlan {
        let sorted_nodes = self.stable_toposort();
        let waves = self.create_waves(&sorted_nodes);

        ExecutionPlan {
            order: sorted_nodes
                .iter()
                .map(|&node| self.graph[node].clone())
                .collect(),
            waves,
            total_tasks: self.task_indices.len(),
        }
    }

    /// Kahn's algorithm, always releasing the earliest-declared ready task
    fn stable_toposort(&self) -> Vec<NodeIndex> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|node| in_degree[node.index()] == 0)
            .map(Reverse)
            .collect();

        let mut sorted = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(node)) = ready.pop() {
            sorted.push(node);
            for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                in_degree[dependent.index()] -= 1;
                if in_degree[dependent.index()] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        sorted
    }

    /// Group tasks by longest dependency chain leading to them
    fn create_waves(&self, sorted_nodes: &[NodeIndex]) -> Vec<Vec<String>> {
        let mut depth = vec![0usize; self.graph.node_count()];
        for &node in sorted_nodes {
            depth[node.index()] = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|dep| depth[dep.index()] + 1)
                .max()
                .unwrap_or(0);
        }

        let wave_count = depth.iter().max().map(|d| d + 1).unwrap_or(0);
        let mut waves = vec![Vec::new(); wave_count];
        for node in self.graph.node_indices() {
            waves[depth[node.index()]].push(self.graph[node].clone());
        }

        waves
    }

    fn sorted_names(&self, mut nodes: Vec<NodeIndex>) -> Vec<String> {
        nodes.sort();
        nodes.dedup();
        nodes
            .into_iter()
            .map(|node| self.graph[node].clone())
            .collect()
    }

    /// Direct dependencies of a task
    pub fn dependencies_of(&self, task_id: &str) -> Vec<String> {
        match self.task_indices.get(task_id) {
            Some(&node) => self.sorted_names(
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .collect(),
            ),
            None => Vec::new(),
        }
    }

    /// Tasks that directly depend on a task
    pub fn dependents_of(&self, task_id: &str) -> Vec<String> {
        match self.task_indices.get(task_id) {
            Some(&node) => self.sorted_names(
                self.graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .collect(),
            ),
            None => Vec::new(),
        }
    }

    /// Every task reachable downstream of a task
    pub fn transitive_dependents(&self, task_id: &str) -> Vec<String> {
        let Some(&start) = self.task_indices.get(task_id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        self.sorted_names(visited.into_iter().collect())
    }

    /// Tasks with no dependencies
    pub fn roots(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter(|&node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|node| self.graph[node].clone())
            .collect()
    }

    /// Tasks nothing depends on
    pub fn leaves(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter(|&node| {
                self.graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|node| self.graph[node].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.task_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_indices.is_empty()
    }
}

impl ExecutionPlan {
    /// Largest wave size
    pub fn max_parallelism(&self) -> usize {
        self.waves.iter().map(|wave| wave.len()).max().unwrap_or(0)
    }

    /// Number of waves
    pub fn depth(&self) -> usize {
        self.waves.len()
    }

    pub fn contains_task(&self, task_id: &str) -> bool {
        self.order.iter().any(|id| id == task_id)
    }

    pub fn wave_of(&self, task_id: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|id| id == task_id))
    }

    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.order.iter().position(|id| id == task_id)
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::TroupeError;
use crate::models::Workflow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub node_id: String,
    pub agent_id: String,
    pub node_type: String,
}

/// Groups run in order; steps inside one group have no ordering dependency
/// between them and are parallel-eligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    groups: Vec<Vec<PlanStep>>,
}

impl ExecutionPlan {
    pub fn groups(&self) -> &[Vec<PlanStep>] {
        &self.groups
    }

    /// All steps, flattened in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.groups.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Converts a workflow graph into an ordered sequence of executable steps.
pub struct ExecutionPlanner;

impl ExecutionPlanner {
    /// Without edges, the plan is every agent-bearing node in workflow
    /// insertion order, strictly sequential. With edges, a topological
    /// order is derived instead; cycles and edges naming unknown nodes
    /// fail the plan before any provider call happens.
    pub fn plan(workflow: &Workflow) -> Result<ExecutionPlan, TroupeError> {
        let mut seen = HashMap::new();
        for (index, node) in workflow.nodes.iter().enumerate() {
            if seen.insert(node.id.as_str(), index).is_some() {
                return Err(TroupeError::Plan(format!("duplicate node id: {}", node.id)));
            }
        }

        if !workflow.has_edges() {
            let groups = workflow
                .nodes
                .iter()
                .filter_map(Self::step_for)
                .map(|step| vec![step])
                .collect();
            return Ok(ExecutionPlan { groups });
        }

        Self::plan_topological(workflow, &seen)
    }

    fn step_for(node: &crate::models::WorkflowNode) -> Option<PlanStep> {
        node.data.agent_id.as_ref().map(|agent_id| PlanStep {
            node_id: node.id.clone(),
            agent_id: agent_id.clone(),
            node_type: node.node_type.clone(),
        })
    }

    /// Kahn's algorithm over all nodes, layered so that nodes with no
    /// ordering dependency between them land in the same parallel-eligible
    /// group. Structural nodes without an agent id participate in the
    /// layering (ordering their neighbors) but are dropped from the emitted
    /// plan.
    fn plan_topological(
        workflow: &Workflow,
        index_of: &HashMap<&str, usize>,
    ) -> Result<ExecutionPlan, TroupeError> {
        let node_count = workflow.nodes.len();
        let mut in_degree = vec![0usize; node_count];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];

        for edge in &workflow.edges {
            let source = *index_of.get(edge.source.as_str()).ok_or_else(|| {
                TroupeError::Plan(format!(
                    "edge {} references unknown source node: {}",
                    edge.id, edge.source
                ))
            })?;
            let target = *index_of.get(edge.target.as_str()).ok_or_else(|| {
                TroupeError::Plan(format!(
                    "edge {} references unknown target node: {}",
                    edge.id, edge.target
                ))
            })?;
            successors[source].push(target);
            in_degree[target] += 1;
        }

        let mut ready: Vec<usize> =
            (0..node_count).filter(|&i| in_degree[i] == 0).collect();
        let mut processed = 0usize;
        let mut groups = Vec::new();

        while !ready.is_empty() {
            // Insertion order within a layer keeps the plan deterministic.
            ready.sort_unstable();
            let layer = std::mem::take(&mut ready);
            processed += layer.len();

            let steps: Vec<PlanStep> = layer
                .iter()
                .filter_map(|&i| Self::step_for(&workflow.nodes[i]))
                .collect();
            if !steps.is_empty() {
                groups.push(steps);
            }

            for &node in &layer {
                for &next in &successors[node] {
                    in_degree[next] -= 1;
                    if in_degree[next] == 0 {
                        ready.push(next);
                    }
                }
            }
        }

        if processed < node_count {
            let stuck: Vec<&str> = workflow
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, n)| n.id.as_str())
                .collect();
            return Err(TroupeError::GraphCycle(stuck.join(", ")));
        }

        Ok(ExecutionPlan { groups })
    }
}

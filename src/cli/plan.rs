use crate::engine::ExecutionPlanner;
use crate::errors::TroupeError;
use crate::models::Workflow;

use super::run::load_yaml;
use super::PlanArgs;

pub async fn handle_plan(args: PlanArgs) -> Result<(), TroupeError> {
    let workflow: Workflow = load_yaml(&args.workflow).await?;
    let plan = ExecutionPlanner::plan(&workflow)?;

    println!("{}", serde_json::to_string_pretty(&plan)?);
    eprintln!(
        "{} steps in {} groups ({} nodes, {} edges)",
        plan.len(),
        plan.groups().len(),
        workflow.nodes.len(),
        workflow.edges.len()
    );
    Ok(())
}

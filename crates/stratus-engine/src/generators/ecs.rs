//! ECS correlations that go through an intermediate resource.

use std::collections::BTreeSet;

use stratus_core::errors::{GraphError, SelectorError};
use stratus_core::FxHashMap;

use super::{str_field, str_list, EdgeGenerator, GeneratorContext, GeneratorOutput};
use crate::graph::types::GraphEdge;
use crate::policy::RoleBinding;
use crate::selector::Selector;

/// Items: `{id, targetGroups: [arn...]}`.
pub const DEFAULT_SERVICES_LB_SELECTOR: &str = "ECS|DescribeServices|[*].result.services[].{id: serviceArn, targetGroups: loadBalancers[].targetGroupArn}";
/// Items: `{arn, loadBalancers: [arn...]}`.
pub const DEFAULT_TARGET_GROUPS_SELECTOR: &str = "ElasticLoadBalancingV2|DescribeTargetGroups|[*].result.TargetGroups[].{arn: TargetGroupArn, loadBalancers: LoadBalancerArns}";

/// Load balancer → ECS service, through the service's target groups.
#[derive(Debug, Clone)]
pub struct EcsLoadBalancerGenerator {
    pub services: Selector,
    pub target_groups: Selector,
}

impl EcsLoadBalancerGenerator {
    pub fn new(services: &str, target_groups: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            services: Selector::parse(services)?,
            target_groups: Selector::parse(target_groups)?,
        })
    }

    pub fn builtin() -> Result<Self, SelectorError> {
        Self::new(DEFAULT_SERVICES_LB_SELECTOR, DEFAULT_TARGET_GROUPS_SELECTOR)
    }
}

impl EdgeGenerator for EcsLoadBalancerGenerator {
    fn name(&self) -> &str {
        "ecs-load-balancer"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GraphError> {
        let services = ctx.evaluate(&self.services)?;
        if services.is_empty() {
            return Ok(GeneratorOutput::default());
        }

        let mut balancers_by_group: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for group in ctx.evaluate(&self.target_groups)? {
            let Some(arn) = str_field(&group, "arn") else {
                continue;
            };
            balancers_by_group
                .entry(arn.to_string())
                .or_default()
                .extend(str_list(&group, "loadBalancers").into_iter().map(str::to_string));
        }

        let mut output = GeneratorOutput::default();
        for service in &services {
            let Some(id) = str_field(service, "id") else {
                continue;
            };
            let balancers: BTreeSet<&String> = str_list(service, "targetGroups")
                .into_iter()
                .filter_map(|tg| balancers_by_group.get(tg))
                .flatten()
                .collect();
            for balancer in balancers {
                output
                    .edges
                    .push(GraphEdge::new(balancer.clone(), id, "target-group"));
            }
        }
        Ok(output)
    }
}

/// Items: `{id, taskDefinition}`.
pub const DEFAULT_SERVICES_TASKDEF_SELECTOR: &str =
    "ECS|DescribeServices|[*].result.services[].{id: serviceArn, taskDefinition: taskDefinition}";
/// Items: `{id, taskDefinition}`.
pub const DEFAULT_TASKS_SELECTOR: &str =
    "ECS|DescribeTasks|[*].result.tasks[].{id: taskArn, taskDefinition: taskDefinitionArn}";
/// Items: `{arn, taskRoleArn?, executionRoleArn?}`.
pub const DEFAULT_TASK_DEFINITIONS_SELECTOR: &str = "ECS|DescribeTaskDefinition|[*].result.taskDefinition.{arn: taskDefinitionArn, taskRoleArn: taskRoleArn, executionRoleArn: executionRoleArn}";

/// ECS services and tasks act with their task definition's roles.
#[derive(Debug, Clone)]
pub struct EcsTaskRoleGenerator {
    pub services: Selector,
    pub tasks: Selector,
    pub task_definitions: Selector,
}

impl EcsTaskRoleGenerator {
    pub fn new(services: &str, tasks: &str, task_definitions: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            services: Selector::parse(services)?,
            tasks: Selector::parse(tasks)?,
            task_definitions: Selector::parse(task_definitions)?,
        })
    }

    pub fn builtin() -> Result<Self, SelectorError> {
        Self::new(
            DEFAULT_SERVICES_TASKDEF_SELECTOR,
            DEFAULT_TASKS_SELECTOR,
            DEFAULT_TASK_DEFINITIONS_SELECTOR,
        )
    }
}

impl EdgeGenerator for EcsTaskRoleGenerator {
    fn name(&self) -> &str {
        "ecs-task-role"
    }

    fn generate(&self, ctx: &GeneratorContext<'_>) -> Result<GeneratorOutput, GraphError> {
        let definitions = ctx.evaluate(&self.task_definitions)?;
        if definitions.is_empty() {
            return Ok(GeneratorOutput::default());
        }

        let mut roles_by_definition: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for definition in &definitions {
            let Some(arn) = str_field(definition, "arn") else {
                continue;
            };
            let roles = ["taskRoleArn", "executionRoleArn"]
                .iter()
                .filter_map(|k| str_field(definition, k))
                .map(str::to_string);
            roles_by_definition.entry(arn.to_string()).or_default().extend(roles);
        }

        let mut bindings = BTreeSet::new();
        for selector in [&self.services, &self.tasks] {
            for executor in ctx.evaluate(selector)? {
                let (Some(id), Some(definition)) =
                    (str_field(&executor, "id"), str_field(&executor, "taskDefinition"))
                else {
                    continue;
                };
                for role in roles_by_definition.get(definition).into_iter().flatten() {
                    bindings.insert((role.clone(), id.to_string()));
                }
            }
        }

        Ok(GeneratorOutput {
            edges: Vec::new(),
            role_bindings: bindings
                .into_iter()
                .map(|(role, executor)| RoleBinding::new(role, executor))
                .collect(),
        })
    }
}

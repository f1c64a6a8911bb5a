//! Dependency ordering of registered checks.
//!
//! Depth-first post-order over the "depends on" edges: a check is placed
//! after everything it depends on, and registration order breaks ties.
//! Dependencies naming unregistered checks are ignored here; the engine
//! skips their dependents at run time.

use std::collections::HashMap;

use crate::engine::check::Check;
use crate::error::{DoctorError, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Indices into `checks` in a valid execution order.
pub fn execution_order(checks: &[Box<dyn Check>]) -> Result<Vec<usize>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(checks.len());
    for (i, check) in checks.iter().enumerate() {
        if index.insert(check.id().as_str(), i).is_some() {
            return Err(DoctorError::DuplicateCheck {
                id: check.id().to_string(),
            });
        }
    }

    let mut marks = vec![Mark::Unvisited; checks.len()];
    let mut order = Vec::with_capacity(checks.len());
    let mut stack = Vec::new();
    for i in 0..checks.len() {
        visit(i, checks, &index, &mut marks, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    i: usize,
    checks: &[Box<dyn Check>],
    index: &HashMap<&str, usize>,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<()> {
    match marks[i] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            let start = stack.iter().position(|&s| s == i).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..]
                .iter()
                .map(|&s| checks[s].id().to_string())
                .collect();
            cycle.push(checks[i].id().to_string());
            return Err(DoctorError::DependencyCycle { checks: cycle });
        }
        Mark::Unvisited => {}
    }

    marks[i] = Mark::Visiting;
    stack.push(i);
    for dep in checks[i].dependencies() {
        if let Some(&d) = index.get(dep.as_str()) {
            visit(d, checks, index, marks, stack, order)?;
        }
    }
    stack.pop();
    marks[i] = Mark::Done;
    order.push(i);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::check::{CheckId, CheckOutcome};
    use crate::engine::context::DiagnosticContext;
    use async_trait::async_trait;

    struct Node {
        id: &'static str,
        deps: Vec<CheckId>,
    }

    #[async_trait]
    impl Check for Node {
        fn id(&self) -> CheckId {
            CheckId(self.id)
        }
        fn name(&self) -> &'static str {
            self.id
        }
        fn description(&self) -> &'static str {
            ""
        }
        fn dependencies(&self) -> &[CheckId] {
            &self.deps
        }
        async fn run(&self, _ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
            Ok(CheckOutcome::pass("ok"))
        }
    }

    fn node(id: &'static str, deps: &[&'static str]) -> Box<dyn Check> {
        Box::new(Node {
            id,
            deps: deps.iter().map(|d| CheckId(*d)).collect(),
        })
    }

    fn ids(checks: &[Box<dyn Check>], order: &[usize]) -> Vec<&'static str> {
        order.iter().map(|&i| checks[i].id().as_str()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let checks = vec![node("c", &["b"]), node("b", &["a"]), node("a", &[]), node("d", &[])];
        let order = execution_order(&checks).unwrap();
        assert_eq!(ids(&checks, &order), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_registration_order_is_kept_when_independent() {
        let checks = vec![node("x", &[]), node("y", &[]), node("z", &["x"])];
        let order = execution_order(&checks).unwrap();
        assert_eq!(ids(&checks, &order), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_unregistered_dependency_is_ignored() {
        let checks = vec![node("a", &["ghost"])];
        assert_eq!(execution_order(&checks).unwrap(), vec![0]);
    }

    #[test]
    fn test_two_node_cycle() {
        let checks = vec![node("x", &["y"]), node("y", &["x"])];
        match execution_order(&checks) {
            Err(DoctorError::DependencyCycle { checks }) => {
                assert_eq!(checks, vec!["x", "y", "x"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle_and_duplicates() {
        let checks = vec![node("s", &["s"])];
        assert!(matches!(
            execution_order(&checks),
            Err(DoctorError::DependencyCycle { .. })
        ));
        let checks = vec![node("a", &[]), node("a", &[])];
        assert!(matches!(
            execution_order(&checks),
            Err(DoctorError::DuplicateCheck { id }) if id == "a"
        ));
    }
}

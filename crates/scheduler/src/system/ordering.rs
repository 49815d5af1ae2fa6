use std::collections::HashSet;

use uuid::Uuid;

use crate::job::JobHandle;

/// Order a batch so every job follows the in-batch jobs it depends on.
///
/// Depth-first post-order over the dependency edges, visiting roots in input
/// order, so an already well-ordered batch comes back unchanged. Jobs outside
/// the batch are walked through but not emitted, so a batch job reached only
/// via an outside job still lands ahead of its dependent. Duplicate handles
/// are kept once.
pub fn dependency_order<I>(jobs: I) -> Vec<JobHandle>
where
    I: IntoIterator<Item = JobHandle>,
{
    let jobs: Vec<JobHandle> = jobs.into_iter().collect();
    let members: HashSet<Uuid> = jobs.iter().map(|job| job.id()).collect();
    let mut visited: HashSet<Uuid> = HashSet::with_capacity(jobs.len());
    let mut ordered = Vec::with_capacity(members.len());
    let mut stack: Vec<(JobHandle, usize)> = Vec::new();

    for root in jobs {
        if !visited.insert(root.id()) {
            continue;
        }
        stack.push((root, 0));

        while let Some((current, cursor)) = stack.last_mut() {
            let next = current.dependencies().get(*cursor).cloned();
            *cursor += 1;
            match next {
                Some(dependency) => {
                    if visited.insert(dependency.id()) {
                        stack.push((dependency, 0));
                    }
                }
                None => {
                    if let Some((finished, _)) = stack.pop() {
                        if members.contains(&finished.id()) {
                            ordered.push(finished);
                        }
                    }
                }
            }
        }
    }

    ordered
}

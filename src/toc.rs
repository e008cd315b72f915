use crate::formats::{FragmentResult, TocNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Position in document order.
    pub index: usize,
    pub topic_id: String,
    pub name: String,
}

/// A job together with the `content` field of the node it was created from.
#[derive(Debug)]
pub struct JobSlot<'t> {
    pub job: FetchJob,
    slot: &'t mut Option<FragmentResult>,
}

impl JobSlot<'_> {
    pub fn attach(&mut self, result: FragmentResult) {
        *self.slot = Some(result);
    }
}

/// Pre-order (document order) walk producing one job per node with a
/// non-blank topic id.
pub fn flatten_jobs(roots: &mut [TocNode]) -> Vec<JobSlot<'_>> {
    let mut out = Vec::new();
    for root in roots.iter_mut() {
        visit(root, &mut out);
    }
    out
}

fn visit<'t>(node: &'t mut TocNode, out: &mut Vec<JobSlot<'t>>) {
    let TocNode {
        name,
        topic_id,
        children,
        content,
        ..
    } = node;

    if let Some(id) = topic_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        let job = FetchJob {
            index: out.len(),
            topic_id: id.to_owned(),
            name: name.as_deref().map(str::trim).unwrap_or_default().to_owned(),
        };
        out.push(JobSlot { job, slot: content });
    }

    for child in children.iter_mut() {
        visit(child, out);
    }
}

pub fn count_topics(roots: &[TocNode]) -> usize {
    roots
        .iter()
        .map(|node| {
            usize::from(node.fetchable_topic_id().is_some()) + count_topics(&node.children)
        })
        .sum()
}

/// Prunes the day down to the chain of ancestors leading to `topic_id`.
pub fn find_topic_branch(roots: Vec<TocNode>, topic_id: &str) -> Option<Vec<TocNode>> {
    let topic_id = topic_id.trim();
    roots
        .into_iter()
        .find_map(|root| prune_to_topic(root, topic_id))
        .map(|root| vec![root])
}

fn prune_to_topic(mut node: TocNode, topic_id: &str) -> Option<TocNode> {
    if node.fetchable_topic_id() == Some(topic_id) {
        return Some(node);
    }
    let children = std::mem::take(&mut node.children);
    let kept = children
        .into_iter()
        .find_map(|child| prune_to_topic(child, topic_id))?;
    node.children = vec![kept];
    Some(node)
}

use std::{cmp::Reverse, collections::HashMap};

use crate::api::{Comment, CommentId};

/// One comment with the replies it owns. The tree is strict: every node
/// lives in exactly one `replies` list or in the root list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Builds the reply tree for one subject's eligible comment set.
///
/// Pure and total: any well-typed input produces a tree containing every
/// input record exactly once. A record whose parent is not in the input
/// becomes a root rather than being dropped. Roots are ordered newest
/// first, replies oldest first at every depth; ties on equal timestamps
/// order by id, so the output depends only on the input set.
pub fn build_comment_tree(records: Vec<Comment>) -> Vec<CommentNode> {
    // Index pass: exactly one node per record.
    let mut order = Vec::with_capacity(records.len());
    let mut nodes: HashMap<CommentId, CommentNode> = HashMap::with_capacity(records.len());
    for comment in records {
        order.push(comment.id);
        nodes.insert(
            comment.id,
            CommentNode {
                comment,
                replies: Vec::new(),
            },
        );
    }

    // Attach pass: a single forward pass deciding, for each record, whether
    // it hangs off a present parent or starts at the root. Kept as id
    // adjacency so each node still has exactly one owner when moved out of
    // the index below.
    let mut children: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
    let mut roots = Vec::new();
    for id in order {
        let parent = nodes.get(&id).and_then(|n| n.comment.parent_id);
        match parent {
            Some(parent) if parent != id && nodes.contains_key(&parent) => {
                children.entry(parent).or_insert_with(Vec::new).push(id)
            }
            _ => roots.push(id),
        }
    }

    let mut out = Vec::with_capacity(roots.len());
    for id in roots {
        if let Some(node) = assemble(id, &mut nodes, &children) {
            out.push(node);
        }
    }

    // Records trapped in a parent cycle are reachable from no root; promote
    // them, oldest first, so every input record still appears exactly once.
    while let Some(id) = nodes
        .values()
        .min_by_key(|n| (n.comment.created_at, n.comment.id))
        .map(|n| n.comment.id)
    {
        tracing::warn!(
            comment_id = ?id.0,
            "comment is caught in a parent cycle, promoting to top level"
        );
        if let Some(node) = assemble(id, &mut nodes, &children) {
            out.push(node);
        }
    }

    // Sort pass: roots newest first, replies oldest first at every depth.
    out.sort_unstable_by_key(|n| (Reverse(n.comment.created_at), n.comment.id));
    for node in &mut out {
        sort_replies(node);
    }
    out
}

fn assemble(
    id: CommentId,
    nodes: &mut HashMap<CommentId, CommentNode>,
    children: &HashMap<CommentId, Vec<CommentId>>,
) -> Option<CommentNode> {
    let mut node = nodes.remove(&id)?;
    if let Some(kids) = children.get(&id) {
        for kid in kids {
            if let Some(child) = assemble(*kid, nodes, children) {
                node.replies.push(child);
            }
        }
    }
    Some(node)
}

fn sort_replies(node: &mut CommentNode) {
    node.replies
        .sort_unstable_by_key(|n| (n.comment.created_at, n.comment.id));
    for reply in &mut node.replies {
        sort_replies(reply);
    }
}

/// Depth-first walk over a built tree, yielding each node exactly once with
/// its depth (roots at 0), in display order.
pub fn walk(roots: &[CommentNode]) -> Walk<'_> {
    Walk {
        stack: roots.iter().rev().map(|n| (0, n)).collect(),
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a CommentNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a CommentNode);

    fn next(&mut self) -> Option<(usize, &'a CommentNode)> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.replies.iter().rev().map(|n| (depth + 1, n)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ArticleId, Subject, Time};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn id(n: u8) -> CommentId {
        CommentId(Uuid::from_u128(n as u128))
    }

    fn day(d: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn record(n: u8, parent: Option<u8>, created_at: Time) -> Comment {
        Comment {
            id: id(n),
            author_name: None,
            body: format!("comment {}", n),
            subject: Subject::Article(ArticleId::stub()),
            parent_id: parent.map(id),
            approved: true,
            created_at,
            updated_at: created_at,
        }
    }

    fn root_ids(tree: &[CommentNode]) -> Vec<CommentId> {
        tree.iter().map(|n| n.comment.id).collect()
    }

    #[test]
    fn empty_input_builds_empty_tree() {
        assert_eq!(build_comment_tree(Vec::new()), Vec::new());
    }

    #[test]
    fn example_scenario_orders_roots_desc_and_replies_asc() {
        // a and c are top-level, b replies to a, d's parent is not in the set
        let records = vec![
            record(1, None, day(2)),     // a
            record(2, Some(1), day(3)),  // b
            record(3, None, day(1)),     // c
            record(4, Some(99), day(4)), // d
        ];
        let tree = build_comment_tree(records);
        assert_eq!(root_ids(&tree), vec![id(4), id(1), id(3)]);
        assert_eq!(tree[1].replies.len(), 1);
        assert_eq!(tree[1].replies[0].comment.id, id(2));
        assert_eq!(tree[0].replies, Vec::new());
        assert_eq!(tree[2].replies, Vec::new());
    }

    #[test]
    fn orphans_become_roots_not_errors() {
        let records = vec![record(1, Some(42), day(1))];
        let tree = build_comment_tree(records);
        assert_eq!(root_ids(&tree), vec![id(1)]);
        assert_eq!(tree[0].replies, Vec::new());
    }

    #[test]
    fn input_order_does_not_change_output() {
        let mut records = vec![
            record(1, None, day(2)),
            record(2, Some(1), day(3)),
            record(3, None, day(1)),
            record(4, Some(1), day(3)), // tied with 2, breaks by id
            record(5, None, day(2)),    // tied with 1, breaks by id
        ];
        let forward = build_comment_tree(records.clone());
        records.reverse();
        let backward = build_comment_tree(records);
        assert_eq!(forward, backward);
        assert_eq!(root_ids(&forward), vec![id(1), id(5), id(3)]);
        assert_eq!(
            forward[0]
                .replies
                .iter()
                .map(|n| n.comment.id)
                .collect::<Vec<_>>(),
            vec![id(2), id(4)]
        );
    }

    #[test]
    fn distinct_timestamps_sort_strictly() {
        let records = vec![
            record(1, None, day(3)),
            record(2, None, day(1)),
            record(3, None, day(5)),
            record(4, Some(2), day(6)),
            record(5, Some(2), day(2)),
            record(6, Some(2), day(4)),
        ];
        let tree = build_comment_tree(records);
        let root_times: Vec<Time> = tree.iter().map(|n| n.comment.created_at).collect();
        assert!(root_times.windows(2).all(|w| w[0] > w[1]));
        let replies: Vec<Time> = tree
            .iter()
            .find(|n| n.comment.id == id(2))
            .expect("node 2 is a root")
            .replies
            .iter()
            .map(|n| n.comment.created_at)
            .collect();
        assert_eq!(replies.len(), 3);
        assert!(replies.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reply_chain_nests_linearly() {
        let records: Vec<Comment> = (1..=6)
            .map(|n| record(n, (n > 1).then(|| n - 1), day(n as u32)))
            .collect();
        let tree = build_comment_tree(records);
        assert_eq!(tree.len(), 1);
        let depths: Vec<(usize, CommentId)> = walk(&tree).map(|(d, n)| (d, n.comment.id)).collect();
        assert_eq!(
            depths,
            (1..=6).map(|n| (n as usize - 1, id(n))).collect::<Vec<_>>()
        );
    }

    #[test]
    fn malformed_parent_chains_still_keep_every_record() {
        // 1 references itself; 2 and 3 reference each other
        let records = vec![
            record(1, Some(1), day(1)),
            record(2, Some(3), day(2)),
            record(3, Some(2), day(3)),
        ];
        let tree = build_comment_tree(records);
        let seen: BTreeSet<CommentId> = walk(&tree).map(|(_, n)| n.comment.id).collect();
        assert_eq!(seen, BTreeSet::from([id(1), id(2), id(3)]));
        // the oldest record of the 2<->3 cycle is promoted and keeps its reply
        let promoted = tree
            .iter()
            .find(|n| n.comment.id == id(2))
            .expect("node 2 got promoted to a root");
        assert_eq!(promoted.replies.len(), 1);
        assert_eq!(promoted.replies[0].comment.id, id(3));
    }

    #[test]
    fn every_input_record_lands_exactly_once() {
        bolero::check!()
            .with_type::<Vec<(u8, Option<u8>, u8)>>()
            .cloned()
            .for_each(|raw| {
                let records: Vec<Comment> = raw
                    .iter()
                    .map(|&(n, parent, d)| record(n, parent, day(1 + (d as u32) % 28)))
                    .collect();
                let expected: BTreeSet<CommentId> = records.iter().map(|c| c.id).collect();
                let tree = build_comment_tree(records);
                let mut seen = Vec::new();
                for (_, node) in walk(&tree) {
                    seen.push(node.comment.id);
                }
                assert_eq!(seen.len(), expected.len());
                assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
            })
    }
}

//! Ordering collection
//!
//! Revisions are kept in an unbalanced binary search tree keyed by the Unix
//! time of their id. Equal keys go right, so revisions sharing a timestamp
//! drain in insertion order. A collection lives for one batch only.

use crate::error::RevisionResult;
use crate::revision::Revision;

struct Node {
    key: i64,
    revision: Revision,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

/// Yields revisions in ascending chronological order
#[derive(Default)]
pub struct Collection {
    root: Option<Box<Node>>,
    len: usize,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from the given revisions
    pub fn from_revisions<I>(revisions: I) -> RevisionResult<Self>
    where
        I: IntoIterator<Item = Revision>,
    {
        let mut collection = Self::new();
        for revision in revisions {
            collection.put(revision)?;
        }
        Ok(collection)
    }

    /// Insert a revision, rejecting ids that are not valid timestamps
    pub fn put(&mut self, revision: Revision) -> RevisionResult<()> {
        let key = revision.timestamp()?;

        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = if key < node.key {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        *slot = Some(Box::new(Node {
            key,
            revision,
            left: None,
            right: None,
        }));
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every revision, in-order
    pub fn drain(&mut self) -> Vec<Revision> {
        let mut revisions = Vec::with_capacity(self.len);
        let mut stack: Vec<Box<Node>> = Vec::new();
        let mut current = self.root.take();

        loop {
            while let Some(mut node) = current {
                current = node.left.take();
                stack.push(node);
            }

            match stack.pop() {
                Some(node) => {
                    let Node {
                        revision, right, ..
                    } = *node;
                    current = right;
                    revisions.push(revision);
                }
                None => break,
            }
        }

        self.len = 0;
        revisions
    }
}

impl Drop for Collection {
    // Sorted input builds a linear chain; avoid recursive drops on it.
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

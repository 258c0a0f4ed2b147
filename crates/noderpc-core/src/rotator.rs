//! Cyclic node rotation over an immutable node set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use url::Url;

use crate::error::{ClientError, TransportError};

/// One node endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    url: Url,
}

impl Node {
    /// Parse a node base URL.
    pub fn parse(url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(url).map_err(|e| ClientError::Config(format!("{url}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ClientError::Config(format!("{url}: not a base URL")));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// URL to POST `method` to: the method is appended as path segments.
    pub fn endpoint(&self, method: &str) -> Result<Url, TransportError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.url.to_string()))?
            .pop_if_empty()
            .extend(method.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

/// Holds the node set as an infinite cycle plus the single current node.
///
/// The cursor is advanced atomically, but advancing and publishing the new
/// current node are two steps: concurrent advances may publish out of order.
/// Every published node is still a member of the set.
#[derive(Debug)]
pub struct NodeRotator {
    nodes: Vec<Arc<Node>>,
    cursor: AtomicUsize,
    current: RwLock<Arc<Node>>,
}

impl NodeRotator {
    /// Build a rotator; the first node becomes current.
    pub fn new<I, S>(urls: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nodes = urls
            .into_iter()
            .map(|u| Node::parse(u.as_ref()).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        let first = nodes
            .first()
            .cloned()
            .ok_or_else(|| ClientError::Config("node list is empty".into()))?;
        Ok(Self {
            nodes,
            cursor: AtomicUsize::new(1),
            current: RwLock::new(first),
        })
    }

    /// Switch to the next node in the cycle.
    pub fn advance(&self) {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        self.publish(self.nodes[idx].clone());
    }

    /// Make `url` the current node. The cycle position is not changed.
    pub fn set_current(&self, url: &str) -> Result<(), ClientError> {
        let node = Node::parse(url)?;
        self.publish(Arc::new(node));
        Ok(())
    }

    pub fn current(&self) -> Arc<Node> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_hostname(&self) -> Option<String> {
        self.current().hostname().map(str::to_string)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|n| &**n)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: construction rejects an empty node set.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn publish(&self, node: Arc<Node>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = node;
    }
}

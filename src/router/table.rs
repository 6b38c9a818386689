//! Route table
//!
//! Two-level exact-match map: method, then path. Paths are opaque strings,
//! so `"/static/*filepath"` only ever matches a request for that literal path.

use super::handler::Handler;
use hyper::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, Arc<dyn Handler>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to (method, path), returning the handler it replaced
    pub fn insert(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Option<Arc<dyn Handler>> {
        self.routes
            .entry(method)
            .or_default()
            .insert(path.into(), handler)
    }

    /// Exact-match lookup
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Arc<dyn Handler>> {
        self.routes.get(method)?.get(path).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered (method, path), sorted for stable output
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut all: Vec<(Method, String)> = self
            .routes
            .iter()
            .flat_map(|(method, paths)| {
                paths.keys().map(move |path| (method.clone(), path.clone()))
            })
            .collect();
        all.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        all
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes())
            .finish()
    }
}

//! # Command Dispatch Table
//!
//! An explicitly ordered list of `(method, pattern, strategy)` routes, built
//! once at startup and read-only afterwards.
//!
//! ## Matching
//!
//! Routes are sorted at [`DispatchTableBuilder::build`] by descending
//! [`Specificity`](super::pattern::Specificity): literal segment count, then
//! query constraint count, then length of the literal prefix. Routes of equal
//! specificity keep their registration order. Lookup returns the first route
//! that matches, so `loans/{id}/charges` wins over `loans/{id}` and
//! `loans/{id}?command=approve` over `loans/{id}` for the same request.

use super::pattern::{split_relative_url, PathPattern};
use super::strategy::CommandStrategy;
use crate::error::{DispatchError, RegistryError};
use crate::models::HttpMethod;
use crate::transaction::TransactionalStore;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

struct Route<S: TransactionalStore> {
    method: HttpMethod,
    pattern: PathPattern,
    strategy: Arc<dyn CommandStrategy<S>>,
}

/// The route selected for a request
pub struct RouteMatch<S: TransactionalStore> {
    pub strategy: Arc<dyn CommandStrategy<S>>,
    /// Pattern of the selected route, as registered
    pub pattern: String,
    pub path: String,
    pub path_params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl<S: TransactionalStore> fmt::Debug for RouteMatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("path", &self.path)
            .field("path_params", &self.path_params)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

pub struct DispatchTableBuilder<S: TransactionalStore> {
    routes: Vec<Route<S>>,
    shapes: HashSet<(HttpMethod, String)>,
}

impl<S: TransactionalStore> DispatchTableBuilder<S> {
    /// Register a strategy for `method` and `pattern`
    pub fn route(
        self,
        method: HttpMethod,
        pattern: &str,
        strategy: impl CommandStrategy<S> + 'static,
    ) -> Result<Self, RegistryError> {
        self.route_shared(method, pattern, Arc::new(strategy))
    }

    /// Register an already shared strategy, e.g. one serving several routes
    pub fn route_shared(
        mut self,
        method: HttpMethod,
        pattern: &str,
        strategy: Arc<dyn CommandStrategy<S>>,
    ) -> Result<Self, RegistryError> {
        let pattern = PathPattern::parse(pattern)?;
        if !self.shapes.insert((method, pattern.shape())) {
            return Err(RegistryError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }
        self.routes.push(Route {
            method,
            pattern,
            strategy,
        });
        Ok(self)
    }

    pub fn build(mut self) -> CommandDispatchTable<S> {
        // Stable sort: equal specificity keeps registration order
        self.routes
            .sort_by(|a, b| a.pattern.cmp_specificity(&b.pattern));
        debug!(routes = self.routes.len(), "Command dispatch table built");
        CommandDispatchTable {
            routes: self.routes,
        }
    }
}

pub struct CommandDispatchTable<S: TransactionalStore> {
    routes: Vec<Route<S>>,
}

impl<S: TransactionalStore> CommandDispatchTable<S> {
    pub fn builder() -> DispatchTableBuilder<S> {
        DispatchTableBuilder {
            routes: Vec::new(),
            shapes: HashSet::new(),
        }
    }

    /// Select the single route for a resolved request
    pub fn dispatch(
        &self,
        method: HttpMethod,
        relative_url: &str,
    ) -> Result<RouteMatch<S>, DispatchError> {
        let (path, segments, query) = split_relative_url(relative_url);

        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route.pattern.matches(&segments, &query).map(|path_params| RouteMatch {
                    strategy: Arc::clone(&route.strategy),
                    pattern: route.pattern.as_str().to_string(),
                    path: path.clone(),
                    path_params,
                    query: query.clone(),
                })
            })
            .ok_or_else(|| DispatchError::UnsupportedOperation {
                method,
                path: relative_url.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered routes in matching order
    pub fn routes(&self) -> impl Iterator<Item = (HttpMethod, &str)> {
        self.routes
            .iter()
            .map(|route| (route.method, route.pattern.as_str()))
    }
}

impl<S: TransactionalStore> fmt::Debug for CommandDispatchTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes().map(|(method, pattern)| format!("{method} {pattern}")))
            .finish()
    }
}

// Reference request dispatcher over the compiled route table
//
// The real host kernel owns transport; this loop exists so the
// compiled registry can be exercised end to end: match a route, run
// its Before chain, the handler, then the After chain.

use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::registry::Registry;
use std::collections::HashMap;
use tracing::debug;

impl Registry {
    /// Dispatch a request through the compiled route table.
    ///
    /// A path that matches no route fails with `RouteNotFound`; a path
    /// that matches only under a different HTTP method fails with
    /// `MethodNotAllowed`.
    pub async fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (path, query) = request
            .path
            .split_once('?')
            .map(|(p, q)| (p.to_string(), Some(q.to_string())))
            .unwrap_or((request.path.clone(), None));

        if let Some(query) = query {
            request.query_params = parse_query_string(&query);
        }

        let mut path_matched = false;
        for route in self.routes() {
            let Some(params) = match_path(&route.path, &path) else {
                continue;
            };
            path_matched = true;

            if !route.accepts(&request.method) {
                continue;
            }

            debug!(path = %path, method = %request.method, "Dispatching route");
            request.path = path;
            request.path_params = params;
            return route.filters.run(request, &route.handler).await;
        }

        if path_matched {
            Err(Error::MethodNotAllowed(format!(
                "{} {}",
                request.method, path
            )))
        } else {
            Err(Error::RouteNotFound(format!("{} {}", request.method, path)))
        }
    }
}

/// Match a route path pattern against a request path.
/// Returns Some(params) if matched, None otherwise.
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}

/// Parse a query string into a map of parameters.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next()?;
            if key.is_empty() {
                return None;
            }
            let value = split.next().unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

// Filter chain execution around route handlers

use crate::descriptor::BoxFuture;
use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of one Before filter.
pub enum FilterFlow {
    /// Continue with this (possibly mutated) request.
    Next(HttpRequest),
    /// Short-circuit: skip remaining Before filters and the handler.
    Halt(HttpResponse),
}

/// Compiled Before filter: inspects or mutates the inbound request and
/// may answer it directly.
pub type BeforeFn = Arc<dyn Fn(HttpRequest) -> BoxFuture<Result<FilterFlow, Error>> + Send + Sync>;

/// Compiled After filter: receives the request and the current
/// response, returns the response to chain forward.
pub type AfterFn =
    Arc<dyn Fn(HttpRequest, HttpResponse) -> BoxFuture<Result<HttpResponse, Error>> + Send + Sync>;

/// The route handler itself.
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> BoxFuture<Result<HttpResponse, Error>> + Send + Sync>;

/// Ordered pre/post filter chain for one route.
///
/// Execution order is fixed at compile time: every Before filter in
/// declaration order, the handler, every After filter in declaration
/// order. A Before filter that returns a response skips the remaining
/// Before filters and the handler; After filters still run, receiving
/// the short-circuit response.
#[derive(Clone, Default)]
pub struct FilterChain {
    pub before: Vec<BeforeFn>,
    pub after: Vec<AfterFn>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Run the full chain around a handler.
    pub async fn run(&self, mut request: HttpRequest, handler: &HandlerFn) -> Result<HttpResponse, Error> {
        debug!(
            before = self.before.len(),
            after = self.after.len(),
            path = %request.path,
            "Executing filter chain"
        );

        let mut short_circuit = None;
        for (index, filter) in self.before.iter().enumerate() {
            match filter(request.clone()).await? {
                FilterFlow::Next(next) => {
                    trace!(index, "Before filter passed");
                    request = next;
                }
                FilterFlow::Halt(response) => {
                    trace!(index, "Before filter short-circuited");
                    short_circuit = Some(response);
                    break;
                }
            }
        }

        let mut response = match short_circuit {
            Some(response) => response,
            None => handler(request.clone()).await?,
        };

        for filter in &self.after {
            response = filter(request.clone(), response).await?;
        }

        Ok(response)
    }
}

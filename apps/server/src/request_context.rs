//! Per-request context injected by middleware.

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// Client-supplied `x-correlation-id`, echoed back unchanged.
    pub correlation_id: Option<String>,
}

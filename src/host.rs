//! Host client boundary.
//!
//! [`InterceptorHost`] is the registration surface an HTTP client exposes.
//! [`InterceptorChain`] implements it in memory and runs payloads through the
//! registered interceptors; HTTP client adapters call [`run_request`] before
//! sending and [`run_response`] after receiving.
//!
//! [`run_request`]: InterceptorChain::run_request
//! [`run_response`]: InterceptorChain::run_response

use crate::context::{RequestConfig, Response};
use crate::transformer::TransformError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Interceptor over outgoing requests.
pub type RequestInterceptor =
    Arc<dyn Fn(RequestConfig) -> Result<RequestConfig, TransformError> + Send + Sync>;

/// Interceptor over incoming responses.
pub type ResponseInterceptor =
    Arc<dyn Fn(Response) -> Result<Response, TransformError> + Send + Sync>;

/// Registration identifier handed out by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptorId(pub u64);

impl fmt::Display for InterceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered interceptor registration exposed by an HTTP client.
pub trait InterceptorHost {
    /// Append a request interceptor.
    fn use_request(&self, interceptor: RequestInterceptor) -> InterceptorId;

    /// Append a response interceptor.
    fn use_response(&self, interceptor: ResponseInterceptor) -> InterceptorId;

    /// Remove a request interceptor. Unknown ids are ignored.
    fn eject_request(&self, id: InterceptorId);

    /// Remove a response interceptor. Unknown ids are ignored.
    fn eject_response(&self, id: InterceptorId);
}

/// In-memory request and response interceptor chains.
#[derive(Default)]
pub struct InterceptorChain {
    next_id: AtomicU64,
    requests: RwLock<Vec<(InterceptorId, RequestInterceptor)>>,
    responses: RwLock<Vec<(InterceptorId, ResponseInterceptor)>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> InterceptorId {
        InterceptorId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Pass a request through the request interceptors in registration order.
    pub fn run_request(&self, request: RequestConfig) -> Result<RequestConfig, TransformError> {
        let interceptors = snapshot(&self.requests);
        trace!(count = interceptors.len(), "Running request interceptors");
        interceptors
            .iter()
            .try_fold(request, |request, interceptor| interceptor(request))
    }

    /// Pass a response through the response interceptors in registration order.
    pub fn run_response(&self, response: Response) -> Result<Response, TransformError> {
        let interceptors = snapshot(&self.responses);
        trace!(count = interceptors.len(), "Running response interceptors");
        interceptors
            .iter()
            .try_fold(response, |response, interceptor| interceptor(response))
    }

    /// Number of registered request interceptors.
    pub fn len_requests(&self) -> usize {
        read(&self.requests).len()
    }

    /// Number of registered response interceptors.
    pub fn len_responses(&self) -> usize {
        read(&self.responses).len()
    }
}

/// Clone the current interceptors so none run while the lock is held.
fn snapshot<T: Clone>(chain: &RwLock<Vec<(InterceptorId, T)>>) -> Vec<T> {
    read(chain).iter().map(|(_, f)| f.clone()).collect()
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InterceptorHost for InterceptorChain {
    fn use_request(&self, interceptor: RequestInterceptor) -> InterceptorId {
        let id = self.next_id();
        write(&self.requests).push((id, interceptor));
        id
    }

    fn use_response(&self, interceptor: ResponseInterceptor) -> InterceptorId {
        let id = self.next_id();
        write(&self.responses).push((id, interceptor));
        id
    }

    fn eject_request(&self, id: InterceptorId) {
        write(&self.requests).retain(|(existing, _)| *existing != id);
    }

    fn eject_response(&self, id: InterceptorId) {
        write(&self.responses).retain(|(existing, _)| *existing != id);
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("requests", &self.len_requests())
            .field("responses", &self.len_responses())
            .finish()
    }
}

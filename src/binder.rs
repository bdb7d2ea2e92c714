//! Binding configurations to a host client's interceptor chains.

use crate::context::{RequestConfig, Response};
use crate::host::{InterceptorHost, InterceptorId};
use crate::model::Configuration;
use crate::schema::{Mapper, SchemaMapper};
use crate::transformer::{create_request_transform, create_response_transform};
use std::sync::Arc;
use tracing::info;

/// Interceptors registered by one [`apply`] call.
///
/// Dropping the subscription leaves the interceptors in place; call
/// [`unsubscribe`](Self::unsubscribe) to remove them.
pub struct InterceptorSubscription<'a, H: InterceptorHost + ?Sized> {
    host: &'a H,
    responses: Vec<InterceptorId>,
    requests: Vec<InterceptorId>,
}

impl<'a, H: InterceptorHost + ?Sized> InterceptorSubscription<'a, H> {
    /// Ids of the registered response interceptors, in registration order.
    pub fn response_ids(&self) -> &[InterceptorId] {
        &self.responses
    }

    /// Ids of the registered request interceptors, in registration order.
    pub fn request_ids(&self) -> &[InterceptorId] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.responses.len() + self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Eject every interceptor this subscription registered.
    pub fn unsubscribe(self) {
        for id in &self.responses {
            self.host.eject_response(*id);
        }
        for id in &self.requests {
            self.host.eject_request(*id);
        }

        info!(
            responses = self.responses.len(),
            requests = self.requests.len(),
            "Interceptors unsubscribed"
        );
    }
}

/// Register every entry of `configurations` on `host` with the built-in
/// [`SchemaMapper`].
pub fn apply<'a, H>(host: &'a H, configurations: &[Configuration]) -> InterceptorSubscription<'a, H>
where
    H: InterceptorHost + ?Sized,
{
    apply_with_mapper(host, Arc::new(SchemaMapper), configurations)
}

/// Register every entry of `configurations` on `host`.
///
/// Per configuration, response entries are registered before request
/// entries, each in declaration order. Configurations registered earlier
/// transform a payload before those registered later.
pub fn apply_with_mapper<'a, H>(
    host: &'a H,
    mapper: Arc<dyn Mapper>,
    configurations: &[Configuration],
) -> InterceptorSubscription<'a, H>
where
    H: InterceptorHost + ?Sized,
{
    let mut responses = Vec::new();
    let mut requests = Vec::new();

    for configuration in configurations {
        let base_url = configuration.url.as_str();

        for entry in &configuration.interceptors.responses {
            let transform = create_response_transform(base_url, entry, Arc::clone(&mapper));
            responses.push(
                host.use_response(Arc::new(move |response: Response| {
                    transform.apply(response)
                })),
            );
        }

        for entry in &configuration.interceptors.requests {
            let transform = create_request_transform(base_url, entry, Arc::clone(&mapper));
            requests.push(host.use_request(Arc::new(move |request: RequestConfig| {
                transform.apply(request)
            })));
        }
    }

    info!(
        configurations = configurations.len(),
        responses = responses.len(),
        requests = requests.len(),
        "Interceptors registered"
    );

    InterceptorSubscription {
        host,
        responses,
        requests,
    }
}

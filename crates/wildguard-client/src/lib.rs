pub mod api;
pub mod bindings;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod summary;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use bindings::{Binding, Bindings, MovementAnalysis, Orchestration};
pub use error::{FetchError, FetchResult};
pub use fetch::{resolve_url, ApiRequest, Fetcher};
pub use registry::{BindingSpec, Registry, ResourceKey, ResourceState, SubscriptionHandle};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};

//! Layer trait and abstractions.
//!
//! Layers wrap providers with cross-cutting concerns (logging, timeouts)
//! and compose at build time. A layer sees one backend call at a time and must
//! not retry; retries are the runtime's job.

use crate::error::BackendError;
use crate::provider::Provider;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping providers.
///
/// Each layer wraps an inner provider and returns a new provider with
/// enhanced behavior.
pub trait Layer<P: Provider> {
    /// The type of the layered provider
    type LayeredProvider: Provider;

    /// Wrap the inner provider with this layer
    fn layer(&self, inner: P) -> Self::LayeredProvider;
}

/// Helper trait for layered providers.
///
/// Provides forwarding defaults so implementers only override the calls they
/// intercept. Pair with [`impl_layered_provider!`](crate::impl_layered_provider)
/// to derive the `Provider` impl.
#[async_trait]
pub trait LayeredProvider: Sized + Provider {
    /// The inner provider type
    type Inner: Provider;

    /// Get a reference to the inner provider
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ProviderInfo> {
        self.inner().info()
    }

    /// Default implementation for chat_completion - forwards to inner
    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        self.inner().chat_completion(req).await
    }
}

/// Implement `Provider` for a generic layered provider by forwarding to its
/// `LayeredProvider` methods.
///
/// ```ignore
/// impl_layered_provider!(TimeoutProvider<P>);
/// ```
#[macro_export]
macro_rules! impl_layered_provider {
    ($name:ident < $param:ident >) => {
        #[async_trait::async_trait]
        impl<$param: $crate::provider::Provider> $crate::provider::Provider for $name<$param> {
            fn info(&self) -> std::sync::Arc<$crate::types::ProviderInfo> {
                $crate::layer::LayeredProvider::layered_info(self)
            }

            async fn chat_completion(
                &self,
                req: $crate::types::ChatCompletionRequest,
            ) -> Result<$crate::types::BackendResponse, $crate::error::BackendError> {
                $crate::layer::LayeredProvider::layered_chat_completion(self, req).await
            }
        }
    };
}

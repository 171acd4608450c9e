//! Descriptor execution: resolve, authorize, send, decode, check code.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::envelope::Envelope;
use crate::error::{Error, ErrorKind, Result};
use crate::operation::{AuthScheme, OperationDescriptor};
use crate::request::{Authorization, HttpRequest};
use crate::response::sanitize_error_message;
use crate::security::redact_session_token;
use crate::transport::{HttpTransport, Transport};

/// Sends [`OperationDescriptor`]s to one database and returns their
/// decoded envelopes.
///
/// This layer knows nothing about sessions: the caller supplies the
/// credential. A non-zero envelope code is returned as
/// [`ErrorKind::Domain`] whatever the HTTP status was, and a 2xx status
/// with a non-zero code is still an error.
///
/// Clone is cheap; the transport is shared.
pub struct DataApiClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    endpoint: Endpoint,
}

impl<T: Transport> Clone for DataApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for DataApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataApiClient")
            .field("endpoint", &self.endpoint.base_url())
            .finish_non_exhaustive()
    }
}

impl DataApiClient<HttpTransport> {
    /// Create a client with the default reqwest transport.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    /// Create a client with a configured reqwest transport.
    pub fn with_config(endpoint: Endpoint, config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(endpoint, HttpTransport::new(config)?))
    }
}

impl<T: Transport> DataApiClient<T> {
    /// Create a client over any transport.
    pub fn with_transport(endpoint: Endpoint, transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoint,
        }
    }

    /// The database endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the transport request for a descriptor.
    pub fn build_request(
        &self,
        descriptor: &OperationDescriptor,
        auth: &Authorization,
    ) -> Result<HttpRequest> {
        let scheme_matches = match descriptor.auth {
            AuthScheme::Bearer => matches!(auth, Authorization::Bearer(_)),
            AuthScheme::Basic => matches!(auth, Authorization::Basic(_)),
            AuthScheme::None => matches!(auth, Authorization::None),
        };
        if !scheme_matches {
            return Err(Error::new(ErrorKind::Config(format!(
                "{} {} expects {:?} authorization",
                descriptor.method, descriptor.path, descriptor.auth
            ))));
        }

        let url = self.endpoint.url(&descriptor.path_and_query());
        let request = HttpRequest::new(descriptor.method, url).authorization(auth);

        let request = match &descriptor.payload {
            Some(payload) => request.json_body(serde_json::to_vec(payload)?),
            None if descriptor.method.carries_body() => request.json_body("{}"),
            None => request,
        };

        Ok(request)
    }

    /// Send a descriptor and return its envelope if the code is `"0"`.
    #[instrument(skip(self, descriptor, auth), fields(method = %descriptor.method, path = %redact_session_token(&descriptor.path)))]
    pub async fn send(
        &self,
        descriptor: &OperationDescriptor,
        auth: &Authorization,
    ) -> Result<Envelope> {
        let request = self.build_request(descriptor, auth)?;
        let response = self.transport.send(request).await?;

        let envelope = response.envelope().map_err(|e| {
            debug!(status = response.status, body = %response.body_preview(), "Undecodable response");
            Error::from(e)
        })?;

        if !envelope.is_success() {
            debug!(status = response.status, code = envelope.code(), "Data API error");
            return Err(Error::new(ErrorKind::Domain {
                status: response.status,
                code: envelope.code().to_string(),
                message: sanitize_error_message(envelope.message()),
            }));
        }

        Ok(envelope)
    }
}

//! Upload engine for the Cloudinary API.
//!
//! [`ApiClient::execute`] runs one API call as a background operation: the
//! parameters are validated and signed synchronously, then the transfer runs
//! on the Tokio runtime and reports progress and its outcome through
//! callbacks. The returned [`OperationHandle`] cancels it.
//! Domain methods (`upload`, `rename`, `destroy`, ...) live in [`api`].

pub mod api;
pub mod operation;
pub mod payload;
pub mod results;

use std::future::Future;
use std::sync::Arc;

use cld_core::params::{ActionParams, Params, SigningMode};
use cld_core::signature::{self, ExternalSignature};
use cld_core::{Action, CloudinaryError, Configuration, ErrorMetadata, Result};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

pub use operation::{OperationHandle, OperationState, Progress, ProgressCallback};
pub use payload::Payload;
pub use results::{
    DeleteByTokenResult, DestroyResult, EagerResult, ExplicitResult, ExplodeResult, MultiResult,
    RenameResult, SpriteImageInfo, SpriteResult, TagResult, TextResult, UploadResult,
};

use operation::{CancelOnDrop, OperationShared, ProgressReporter};
use payload::FileField;
use results::ErrorEnvelope;

/// API version segment of every endpoint.
pub const API_VERSION: &str = "v1_1";

/// One API call: typed parameters, an optional payload and an optional
/// externally computed signature.
#[derive(Debug, Clone)]
pub struct Call<P> {
    params: P,
    payload: Option<Payload>,
    signature: Option<ExternalSignature>,
}

impl<P: ActionParams> Call<P> {
    pub fn new(params: P) -> Self {
        Self {
            params,
            payload: None,
            signature: None,
        }
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Use a signature produced elsewhere instead of signing with the local secret.
    pub fn signature(mut self, signature: ExternalSignature) -> Self {
        self.signature = Some(signature);
        self
    }
}

/// A call after validation and signing, ready to send.
struct PreparedCall {
    action: Action,
    url: String,
    fields: Params,
    payload: Option<Payload>,
}

/// HTTP client for the upload and administrative API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: Arc<Configuration>,
}

impl ApiClient {
    pub fn new(config: Configuration) -> Result<Self> {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<Configuration>) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("CloudinaryRust/{}", cld_core::VERSION))
            .build()
            .map_err(|e| CloudinaryError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create client from `CLOUDINARY_URL`.
    pub fn from_env() -> Result<Self> {
        Self::new(Configuration::from_env()?)
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// `{upload_prefix}/v1_1/{cloud}/{resource_type}/{action}`
    pub fn endpoint(&self, action: Action, resource_type: &str) -> String {
        let prefix = self.config.upload_prefix();
        let cloud = self.config.cloud_name();
        if action.has_resource_type() {
            format!("{}/{}/{}/{}/{}", prefix, API_VERSION, cloud, resource_type, action)
        } else {
            format!("{}/{}/{}/{}", prefix, API_VERSION, cloud, action)
        }
    }

    fn prepare<P: ActionParams>(&self, call: Call<P>) -> Result<PreparedCall> {
        self.config.validate()?;
        if matches!(&call.payload, Some(Payload::Url(url)) if url.is_empty()) {
            return Err(CloudinaryError::invalid("Upload URL must not be empty"));
        }

        let action = call.params.action();
        let resource_type = call.params.resource_type().to_string();
        let mode = call.params.signing_mode();
        let params = call.params.into_params()?;

        let fields = match (mode, call.signature) {
            (SigningMode::Signed, Some(external)) => {
                signature::apply_external_signature(&params, &self.config, &external)?
            }
            (SigningMode::Signed, None) => {
                signature::sign_request(&params, &self.config, signature::current_timestamp())?
            }
            (SigningMode::Unsigned { upload_preset }, _) => {
                signature::unsigned_request(&params, &upload_preset)
            }
            (SigningMode::Token, _) => params,
        };

        Ok(PreparedCall {
            action,
            url: self.endpoint(action, &resource_type),
            fields,
            payload: call.payload,
        })
    }

    /// Start `call` in the background.
    ///
    /// Configuration and argument errors are returned immediately and nothing
    /// is sent. Everything after that (transport, service and file errors) goes
    /// to `completion`, which runs exactly once unless the operation is
    /// cancelled. Must be called from within a Tokio runtime.
    pub fn execute<P, T, C>(
        &self,
        call: Call<P>,
        completion: C,
        progress: Option<ProgressCallback>,
    ) -> Result<OperationHandle>
    where
        P: ActionParams,
        T: DeserializeOwned + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let prepared = self.prepare(call)?;
        let shared = OperationShared::new(progress);
        let client = self.client.clone();
        let reporter_shared = shared.clone();
        let action = prepared.action;

        let work = async move {
            let expected = match &prepared.payload {
                Some(payload) => payload.len().await?,
                None => 0,
            };
            let reporter = ProgressReporter::new(reporter_shared, expected);
            let file = match prepared.payload {
                Some(payload) => Some(payload.into_field(reporter).await?),
                None => None,
            };
            let form = build_form(&prepared.fields, file);
            send(client.post(&prepared.url).multipart(form)).await
        };

        spawn_operation(shared, action, work, completion)
    }

    /// Upload a local file in `chunk_size` parts (see [`Configuration::chunk_size`]).
    /// Files no larger than one chunk are sent as a single request.
    pub fn execute_chunked<P, T, C>(
        &self,
        call: Call<P>,
        completion: C,
        progress: Option<ProgressCallback>,
    ) -> Result<OperationHandle>
    where
        P: ActionParams,
        T: DeserializeOwned + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let prepared = self.prepare(call)?;
        let path = match &prepared.payload {
            Some(Payload::File(path)) => path.clone(),
            _ => {
                return Err(CloudinaryError::invalid(
                    "Chunked upload requires a local file payload",
                ))
            }
        };
        let chunk_size = self.config.chunk_size();
        let shared = OperationShared::new(progress);
        let client = self.client.clone();
        let reporter_shared = shared.clone();
        let action = prepared.action;

        let work = async move {
            let total = tokio::fs::metadata(&path).await?.len();
            let reporter = ProgressReporter::new(reporter_shared, total);

            if total <= chunk_size {
                let part = payload::file_range_part(&path, 0, total, reporter).await?;
                let form = build_form(&prepared.fields, Some(FileField::Part(part)));
                return send(client.post(&prepared.url).multipart(form)).await;
            }

            let upload_id = uuid::Uuid::new_v4().simple().to_string();
            let mut offset = 0;
            let mut last = serde_json::Value::Null;
            while offset < total {
                let len = chunk_size.min(total - offset);
                let part = payload::file_range_part(&path, offset, len, reporter.clone()).await?;
                let form = build_form(&prepared.fields, Some(FileField::Part(part)));
                let range = format!("bytes {}-{}/{}", offset, offset + len - 1, total);
                tracing::debug!(upload_id = %upload_id, range = %range, "Sending chunk");

                let request = client
                    .post(&prepared.url)
                    .header("X-Unique-Upload-Id", upload_id.as_str())
                    .header("Content-Range", range)
                    .multipart(form);
                last = send(request).await?;
                offset += len;
            }
            Ok(serde_json::from_value(last)?)
        };

        spawn_operation(shared, action, work, completion)
    }

    /// Run `call` and wait for its result. Dropping the future cancels the operation.
    pub async fn call<P, T>(&self, call: Call<P>) -> Result<T>
    where
        P: ActionParams,
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = self.execute(call, move |result| {
            let _ = tx.send(result);
        }, None)?;
        wait_for(handle, rx).await
    }

    pub(crate) async fn call_chunked<P, T>(
        &self,
        call: Call<P>,
        progress: Option<ProgressCallback>,
    ) -> Result<T>
    where
        P: ActionParams,
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = self.execute_chunked(call, move |result| {
            let _ = tx.send(result);
        }, progress)?;
        wait_for(handle, rx).await
    }
}

async fn wait_for<T>(handle: OperationHandle, rx: oneshot::Receiver<Result<T>>) -> Result<T> {
    let guard = CancelOnDrop(handle);
    let result = rx.await;
    drop(guard);
    // The sender is dropped without a value only when the operation was cancelled
    result.unwrap_or(Err(CloudinaryError::Cancelled))
}

fn spawn_operation<T, C, F>(
    shared: Arc<OperationShared>,
    action: Action,
    work: F,
    completion: C,
) -> Result<OperationHandle>
where
    T: Send + 'static,
    C: FnOnce(Result<T>) + Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| CloudinaryError::config("Operations must be started inside a Tokio runtime"))?;
    let handle = OperationHandle::new(shared.clone());

    runtime.spawn(async move {
        let _finished = FinishOnDrop(shared.clone());
        if !shared.start() {
            tracing::debug!(action = %action, "Operation cancelled before start");
            return;
        }
        tracing::info!(action = %action, "Operation started");

        let token = shared.token().clone();
        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = work => Some(result),
        };

        match outcome {
            Some(Ok(value)) => {
                tracing::info!(action = %action, "Operation completed");
                shared.complete(Ok(value), completion);
            }
            Some(Err(err)) => {
                tracing::warn!(
                    action = %action,
                    error = %err,
                    error_code = err.error_code(),
                    "Operation failed"
                );
                shared.complete(Err(err), completion);
            }
            None => tracing::debug!(action = %action, "Operation aborted"),
        }
    });

    Ok(handle)
}

/// Marks the operation finished when the task exits, including by unwinding
/// out of a panicking completion callback.
struct FinishOnDrop(Arc<OperationShared>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.mark_finished();
    }
}

fn build_form(fields: &Params, file: Option<FileField>) -> Form {
    let mut form = Form::new();
    for (name, value) in fields.to_form_fields() {
        form = form.text(name, value);
    }
    match file {
        Some(FileField::Part(part)) => form.part("file", part),
        Some(FileField::Text(url)) => form.text("file", url),
        None => form,
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await
        .map_err(|e| CloudinaryError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CloudinaryError::Transport(e.to_string()))?;

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return Err(CloudinaryError::Service {
            status: status.as_u16(),
            message: envelope.error.message,
        });
    }
    if !status.is_success() {
        return Err(service_error(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

fn service_error(status: StatusCode, body: &str) -> CloudinaryError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        body.trim().to_string()
    };
    CloudinaryError::Service {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cld_core::{DeleteByTokenParams, DestroyParams, UploadParams};

    fn client() -> ApiClient {
        ApiClient::new(
            Configuration::new("demo")
                .with_credentials("1234", "abcd")
                .with_upload_prefix("http://localhost:9999"),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint() {
        let client = client();
        assert_eq!(
            client.endpoint(Action::Upload, "image"),
            "http://localhost:9999/v1_1/demo/image/upload"
        );
        assert_eq!(
            client.endpoint(Action::DeleteByToken, "image"),
            "http://localhost:9999/v1_1/demo/delete_by_token"
        );
    }

    #[test]
    fn test_prepare_signed() {
        let prepared = client()
            .prepare(Call::new(UploadParams::new().public_id("x").resource_type("raw")))
            .unwrap();
        assert_eq!(prepared.url, "http://localhost:9999/v1_1/demo/raw/upload");
        assert!(prepared.fields.contains_key("signature"));
        assert!(prepared.fields.contains_key("timestamp"));
        assert_eq!(prepared.fields.get_str("api_key"), Some("1234"));
    }

    #[test]
    fn test_prepare_unsigned_skips_signing() {
        let client = ApiClient::new(Configuration::new("demo")).unwrap();
        let prepared = client.prepare(Call::new(UploadParams::unsigned("preset"))).unwrap();
        assert_eq!(prepared.fields.get_str("upload_preset"), Some("preset"));
        assert!(!prepared.fields.contains_key("signature"));
        assert!(!prepared.fields.contains_key("api_key"));
    }

    #[test]
    fn test_prepare_external_signature() {
        let client = ApiClient::new(Configuration::new("demo").with_api_key("1234")).unwrap();
        let prepared = client
            .prepare(Call::new(UploadParams::new()).signature(ExternalSignature::new("sig", 100)))
            .unwrap();
        assert_eq!(prepared.fields.get_str("signature"), Some("sig"));
        assert_eq!(prepared.fields.get_str("timestamp"), Some("100"));
    }

    #[test]
    fn test_prepare_signed_without_credentials_fails_fast() {
        let client = ApiClient::new(Configuration::new("demo")).unwrap();
        let err = client.prepare(Call::new(DestroyParams::new("x"))).err().unwrap();
        assert!(matches!(err, CloudinaryError::Configuration(_)));
    }

    #[test]
    fn test_prepare_delete_by_token_needs_no_credentials() {
        let client = ApiClient::new(Configuration::new("demo")).unwrap();
        let prepared = client.prepare(Call::new(DeleteByTokenParams::new("tok"))).unwrap();
        assert_eq!(prepared.fields.get_str("token"), Some("tok"));
        assert_eq!(prepared.fields.len(), 1);
    }

    #[test]
    fn test_prepare_rejects_empty_upload_url() {
        let err = client()
            .prepare(Call::new(UploadParams::new()).payload(Payload::url("")))
            .err()
            .unwrap();
        assert!(matches!(err, CloudinaryError::InvalidArgument(_)));
    }

    #[test]
    fn test_service_error_falls_back_to_body() {
        let err = service_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "Service error (502): upstream down");
        let err = service_error(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Service error (404): Not Found");
    }

    #[test]
    fn test_execute_outside_runtime_is_an_error() {
        let result = client().execute::<_, UploadResult, _>(
            Call::new(UploadParams::new()).payload(Payload::url("https://example.com/a.jpg")),
            |_| {},
            None,
        );
        assert!(matches!(result, Err(CloudinaryError::Configuration(_))));
    }
}

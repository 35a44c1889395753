//! Domain methods for the upload and administrative API.
//!
//! The async methods wait for the result; dropping their future cancels the
//! call. The `*_with` variants start the operation in the background and
//! return an [`OperationHandle`], reporting through callbacks.

use cld_core::params::ActionParams;
use cld_core::{
    Action, CloudinaryError, DeleteByTokenParams, DestroyParams, ExplicitParams, ExplodeParams, RenameParams, Result,
    SpriteParams, TagsParams, TextParams, UploadParams,
};

use crate::operation::{OperationHandle, ProgressCallback};
use crate::payload::Payload;
use crate::results::{
    DeleteByTokenResult, DestroyResult, ExplicitResult, ExplodeResult, MultiResult, RenameResult,
    SpriteResult, TagResult, TextResult, UploadResult,
};
use crate::{ApiClient, Call};

impl ApiClient {
    // ========================================================================
    // Upload
    // ========================================================================

    /// Upload a file, in-memory data or a remote URL.
    pub async fn upload(&self, payload: Payload, params: UploadParams) -> Result<UploadResult> {
        self.call(Call::new(params).payload(payload)).await
    }

    /// Background upload with progress reporting.
    pub fn upload_with<C>(
        &self,
        payload: Payload,
        params: UploadParams,
        completion: C,
        progress: Option<ProgressCallback>,
    ) -> Result<OperationHandle>
    where
        C: FnOnce(Result<UploadResult>) + Send + 'static,
    {
        self.execute(Call::new(params).payload(payload), completion, progress)
    }

    /// Unsigned upload authorized by an upload preset. Needs no API secret.
    pub async fn unsigned_upload(
        &self,
        payload: Payload,
        upload_preset: &str,
        params: UploadParams,
    ) -> Result<UploadResult> {
        self.upload(payload, params.unsigned_preset(upload_preset))
            .await
    }

    /// Upload a large local file in chunks of [`cld_core::Configuration::chunk_size`] bytes.
    pub async fn upload_large(
        &self,
        path: impl Into<std::path::PathBuf>,
        params: UploadParams,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadResult> {
        self.call_chunked(Call::new(params).payload(Payload::file(path)), progress)
            .await
    }

    pub fn upload_large_with<C>(
        &self,
        path: impl Into<std::path::PathBuf>,
        params: UploadParams,
        completion: C,
        progress: Option<ProgressCallback>,
    ) -> Result<OperationHandle>
    where
        C: FnOnce(Result<UploadResult>) + Send + 'static,
    {
        self.execute_chunked(Call::new(params).payload(Payload::file(path)), completion, progress)
    }

    // ========================================================================
    // Asset management
    // ========================================================================

    /// Apply eager transformations or update metadata of an uploaded asset.
    pub async fn explicit(&self, params: ExplicitParams) -> Result<ExplicitResult> {
        self.call(Call::new(params)).await
    }

    pub async fn rename(&self, params: RenameParams) -> Result<RenameResult> {
        self.call(Call::new(params)).await
    }

    pub async fn destroy(&self, params: DestroyParams) -> Result<DestroyResult> {
        self.call(Call::new(params)).await
    }

    pub fn destroy_with<C>(&self, params: DestroyParams, completion: C) -> Result<OperationHandle>
    where
        C: FnOnce(Result<DestroyResult>) + Send + 'static,
    {
        self.execute(Call::new(params), completion, None)
    }

    /// Delete an asset with a token from an upload made with `return_delete_token`.
    pub async fn delete_by_token(&self, token: &str) -> Result<DeleteByTokenResult> {
        self.call(Call::new(DeleteByTokenParams::new(token))).await
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub async fn tags(&self, params: TagsParams) -> Result<TagResult> {
        self.call(Call::new(params)).await
    }

    pub async fn add_tag(&self, tag: &str, public_ids: &[&str]) -> Result<TagResult> {
        self.tags(TagsParams::add(tag, public_ids.iter().copied())).await
    }

    pub async fn remove_tag(&self, tag: &str, public_ids: &[&str]) -> Result<TagResult> {
        self.tags(TagsParams::remove(tag, public_ids.iter().copied())).await
    }

    /// Replace all tags of the assets with `tag`.
    pub async fn replace_tag(&self, tag: &str, public_ids: &[&str]) -> Result<TagResult> {
        self.tags(TagsParams::replace(tag, public_ids.iter().copied())).await
    }

    pub async fn remove_all_tags(&self, public_ids: &[&str]) -> Result<TagResult> {
        self.tags(TagsParams::remove_all(public_ids.iter().copied())).await
    }

    // ========================================================================
    // Generated assets
    // ========================================================================

    /// Split a multi-page file (PDF, animated GIF) into separate images.
    pub async fn explode(&self, params: ExplodeParams) -> Result<ExplodeResult> {
        self.call(Call::new(params)).await
    }

    /// Sprite sheet from all images with a tag. `params` must come from [`SpriteParams::sprite`].
    pub async fn generate_sprite(&self, params: SpriteParams) -> Result<SpriteResult> {
        expect_action(&params, Action::Sprite)?;
        self.call(Call::new(params)).await
    }

    /// Multi-page file from all images with a tag. `params` must come from [`SpriteParams::multi`].
    pub async fn multi(&self, params: SpriteParams) -> Result<MultiResult> {
        expect_action(&params, Action::Multi)?;
        self.call(Call::new(params)).await
    }

    pub async fn text(&self, params: TextParams) -> Result<TextResult> {
        self.call(Call::new(params)).await
    }
}

fn expect_action(params: &SpriteParams, expected: Action) -> Result<()> {
    if params.action() != expected {
        return Err(CloudinaryError::invalid(format!(
            "{} parameters cannot be sent to the {} endpoint",
            params.action(),
            expected
        )));
    }
    Ok(())
}

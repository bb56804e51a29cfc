//! `ObjectStore` backed by an S3-compatible bucket through the AWS SDK.

use crate::{
    config::AppConfig,
    models::object::{LevelListing, ObjectBody, StoredObject},
    store::{ObjectStore, StoreError, StoreResult},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::{ByteStream, DateTime as SmithyDateTime},
    types::{Delete, Object, ObjectIdentifier},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

const LIST_PAGE_SIZE: i32 = 1000;

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the process configuration.
    ///
    /// Explicit credentials win; without them the default provider chain
    /// (env, profile, instance metadata) is used. A custom endpoint switches
    /// to path-style addressing for MinIO-like servers.
    pub async fn connect(cfg: &AppConfig) -> Result<Self> {
        let bucket = cfg
            .bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .context("AWS_S3_BUCKET must be set when using the s3 store")?;

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(cfg.region.clone()));
        if let (Some(access_key), Some(secret_key)) =
            (cfg.access_key_id.as_ref(), cfg.secret_access_key.as_ref())
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                cfg.session_token.clone(),
                None,
                "bucket-browser",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = cfg.endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::new(Client::from_conf(builder.build()), bucket))
    }

    fn describe(object: &Object) -> StoredObject {
        StoredObject {
            key: object.key().unwrap_or_default().to_string(),
            size: object.size().unwrap_or(0).max(0) as u64,
            last_modified: object.last_modified().and_then(to_chrono),
            content_type: None,
            etag: object.e_tag().map(|e| e.trim_matches('"').to_string()),
        }
    }

    /// Page through `ListObjectsV2` until the listing is complete.
    async fn list_pages(&self, prefix: &str, delimiter: Option<&str>) -> StoreResult<LevelListing> {
        let mut listing = LevelListing::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix((!prefix.is_empty()).then(|| prefix.to_string()))
                .set_delimiter(delimiter.map(str::to_string))
                .set_continuation_token(continuation_token.take())
                .max_keys(LIST_PAGE_SIZE)
                .send()
                .await
                .map_err(|e| self.sdk_error("list_objects_v2", prefix, e))?;

            listing.common_prefixes.extend(
                output
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix())
                    .map(str::to_string),
            );
            listing
                .objects
                .extend(output.contents().iter().map(Self::describe));

            match output.next_continuation_token() {
                Some(token) if output.is_truncated() == Some(true) => {
                    debug!(prefix, token, "following list continuation");
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(listing)
    }

    fn sdk_error<E>(&self, op: &'static str, key: &str, err: SdkError<E>) -> StoreError
    where
        E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    {
        let (code, message) = match err.as_service_error() {
            Some(service_err) => (
                service_err.code().unwrap_or("unknown").to_string(),
                service_err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| service_err.to_string()),
            ),
            None => ("N/A".to_string(), DisplayErrorContext(&err).to_string()),
        };
        error!(
            bucket = %self.bucket,
            key,
            s3_error_code = %code,
            "S3 {op} failed: {message}"
        );
        StoreError::backend(op, format!("{message} ({code})"))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| self.sdk_error("put_object", key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<ObjectBody> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(self.sdk_error("get_object", key, err)),
        };

        let content_type = output.content_type().map(str::to_string);
        let content_length = output.content_length().map(|len| len.max(0) as u64);
        let reader = output.body.into_async_read();

        Ok(ObjectBody {
            stream: Box::pin(ReaderStream::new(reader)),
            content_type,
            content_length,
        })
    }

    async fn list_one_level(&self, prefix: &str, delimiter: &str) -> StoreResult<LevelListing> {
        self.list_pages(prefix, Some(delimiter)).await
    }

    async fn list_all(&self, prefix: &str) -> StoreResult<Vec<StoredObject>> {
        Ok(self.list_pages(prefix, None).await?.objects)
    }

    async fn delete_one(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.sdk_error("delete_object", key, e))?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| StoreError::backend("delete_objects", e.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StoreError::backend("delete_objects", e.to_string()))?;

        let first_key = keys[0].as_str();
        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| self.sdk_error("delete_objects", first_key, e))?;

        // Quiet mode only reports failures.
        if let Some(failed) = output.errors().first() {
            let message = format!(
                "{} of {} keys failed, first `{}`: {}",
                output.errors().len(),
                keys.len(),
                failed.key().unwrap_or_default(),
                failed.message().unwrap_or("unknown error"),
            );
            error!(bucket = %self.bucket, "S3 delete_objects partial failure: {message}");
            return Err(StoreError::backend("delete_objects", message));
        }

        Ok(())
    }

    async fn probe(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| self.sdk_error("head_bucket", "", e))?;
        Ok(())
    }
}

fn to_chrono(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    dt.to_millis()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

//! Object storage abstraction.
//!
//! Uploads land in the uploads bucket (written by the producer API, read
//! here) and generated artifacts land in the assets bucket. The trait keeps
//! handlers testable without network access.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

/// Object storage operations used by the pipeline.
#[async_trait]
pub trait BaseObjectStorage: Send + Sync {
    /// Download an object's full contents.
    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Upload an object, overwriting any existing one at the key.
    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str)
        -> Result<()>;

    /// Public URL for a stored object (used when a stored key is referenced
    /// from rendered HTML, e.g. re-hosted brand logos).
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// S3-backed object storage.
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStorage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BaseObjectStorage for S3ObjectStorage {
    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to get s3://{}/{}", bucket, key))?;

        let body = response
            .body
            .collect()
            .await
            .with_context(|| format!("failed to read body of s3://{}/{}", bucket, key))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("failed to put s3://{}/{}", bucket, key))?;

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", bucket, key)
    }
}

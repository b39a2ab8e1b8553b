//! `ObjectStore` backed by the AWS S3 SDK

use std::time::Duration;

use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream, Client as S3Client};

use super::{BucketError, BucketResult, ObjectStore};

fn presigning_config(expires_in: Duration) -> BucketResult<PresigningConfig> {
    PresigningConfig::expires_in(expires_in).map_err(|e| {
        BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
    })
}

#[async_trait::async_trait]
impl ObjectStore for S3Client {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> BucketResult<String> {
        let presigned_request = self
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config(expires_in)?)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> BucketResult<String> {
        let presigned_request = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config(expires_in)?)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> BucketResult<ByteStream> {
        let output = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BucketError::from_get_object(key, e))?;

        Ok(output.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presigning_config_accepts_one_hour() {
        assert!(presigning_config(Duration::from_secs(3600)).is_ok());
    }

    #[test]
    fn test_presigning_config_rejects_more_than_a_week() {
        let err = presigning_config(Duration::from_secs(8 * 24 * 60 * 60)).unwrap_err();
        assert!(matches!(err, BucketError::ConfigError(_)));
    }
}

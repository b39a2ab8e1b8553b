//! Provisions the file bucket and the CORS rule browsers need for direct uploads
//!
//! Run once per environment, out of band. Safe to re-run.

use aws_sdk_s3::{
    error::BuildError,
    operation::create_bucket::CreateBucketError,
    types::{BucketLocationConstraint, CorsConfiguration, CorsRule, CreateBucketConfiguration},
    Client as S3Client,
};
use filedrop_api::types::Environment;
use tracing_subscriber::{fmt, EnvFilter};

const CORS_MAX_AGE_SECS: i32 = 3000;

fn cors_configuration() -> Result<CorsConfiguration, BuildError> {
    let rule = CorsRule::builder()
        .allowed_origins("*")
        .allowed_methods("GET")
        .allowed_methods("PUT")
        .allowed_headers("*")
        .max_age_seconds(CORS_MAX_AGE_SECS)
        .expose_headers("x-amz-server-side-encryption")
        .build()?;

    CorsConfiguration::builder().cors_rules(rule).build()
}

async fn create_bucket(client: &S3Client, bucket: &str) -> anyhow::Result<()> {
    let mut request = client.create_bucket().bucket(bucket);

    // us-east-1 rejects an explicit location constraint
    if let Some(region) = client.config().region().map(ToString::to_string) {
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }
    }

    match request.send().await {
        Ok(_) => {
            tracing::info!("Created bucket {bucket}");
            Ok(())
        }
        Err(err)
            if err
                .as_service_error()
                .is_some_and(CreateBucketError::is_bucket_already_owned_by_you) =>
        {
            tracing::info!("Bucket {bucket} already exists");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let environment = Environment::from_env();
    let bucket = environment.s3_bucket();
    let client = S3Client::from_conf(environment.s3_client_config().await);

    create_bucket(&client, &bucket).await?;

    client
        .put_bucket_cors()
        .bucket(&bucket)
        .cors_configuration(cors_configuration()?)
        .send()
        .await?;
    tracing::info!("Applied CORS configuration to {bucket}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::CorsRule;

    use super::*;

    #[test]
    fn test_cors_rule_allows_browser_get_and_put() {
        let config = cors_configuration().unwrap();
        let rules: &[CorsRule] = config.cors_rules();
        assert_eq!(rules.len(), 1);

        let rule = &rules[0];
        assert_eq!(rule.allowed_origins(), ["*"]);
        assert_eq!(rule.allowed_methods(), ["GET", "PUT"]);
        assert_eq!(rule.allowed_headers(), ["*"]);
        assert_eq!(rule.max_age_seconds(), Some(3000));
        assert_eq!(rule.expose_headers(), ["x-amz-server-side-encryption"]);
    }
}

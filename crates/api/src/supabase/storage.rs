//! Supabase Storage: uploads to public buckets.

use tracing::instrument;

use super::{Auth, SupabaseClient, SupabaseError};

impl SupabaseClient {
    /// Upload (or overwrite) an object and return its public URL.
    ///
    /// `path` is relative to the bucket; each segment is percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if Storage rejects the upload.
    #[instrument(skip(self, bytes, auth), fields(size = bytes.len()))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        auth: Auth<'_>,
    ) -> Result<String, SupabaseError> {
        let url = format!(
            "{}/storage/v1/object/{bucket}/{}",
            self.inner.base_url,
            encode_path(path)
        );
        let request = self
            .request(reqwest::Method::POST, &url, auth)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes);
        self.send(request).await?;
        Ok(self.public_url(bucket, path))
    }

    /// Public URL of an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{}",
            self.inner.base_url,
            encode_path(path)
        )
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::SupabaseConfig;

    #[test]
    fn test_encode_path_segments() {
        assert_eq!(encode_path("vendor 1/logo.png"), "vendor%201/logo.png");
        assert_eq!(encode_path("/a//b/"), "a/b");
    }

    #[test]
    fn test_public_url() {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "https://abc.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: SecretString::from("service"),
        });
        assert_eq!(
            client.public_url("product-images", "p1/photo.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/product-images/p1/photo.jpg"
        );
    }
}

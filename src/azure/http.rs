//! Raw HTTP calls the SDK does not cover: archive download and the
//! resource-area discovery call used to verify credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{VcsError, VcsResult};

/// An Azure DevOps endpoint split into the parts the SDK and raw calls need.
///
/// `https://dev.azure.com/my-org/` yields base `https://dev.azure.com` and
/// organization `my-org`; an on-premises collection URL
/// `https://tfs.corp/tfs/DefaultCollection` yields base `https://tfs.corp/tfs`
/// and organization `DefaultCollection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureEndpoint {
    base: Url,
    organization: String,
    collection: Url,
}

impl AzureEndpoint {
    pub fn parse(endpoint: &str) -> VcsResult<Self> {
        let trimmed = endpoint.trim().trim_end_matches('/');
        let collection = Url::parse(trimmed).map_err(|e| {
            VcsError::validation(format!("invalid API endpoint '{endpoint}': {e}"))
        })?;

        let segments: Vec<&str> = collection
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let Some((organization, parents)) = segments.split_last() else {
            return Err(VcsError::validation(format!(
                "API endpoint '{endpoint}' must include the organization or collection"
            )));
        };

        let mut base = collection.clone();
        base.set_query(None);
        base.set_path(&parents.join("/"));
        let base = Url::parse(base.as_str().trim_end_matches('/')).map_err(|e| {
            VcsError::validation(format!("invalid API endpoint '{endpoint}': {e}"))
        })?;

        Ok(Self {
            organization: (*organization).to_string(),
            base,
            collection,
        })
    }

    /// Host part the SDK prefixes to `{organization}/...`.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Full collection URL, i.e. base plus organization.
    pub fn collection(&self) -> &Url {
        &self.collection
    }

    /// URL of the zip archive of `branch`.
    pub fn archive_url(&self, project: &str, repository: &str, branch: &str) -> Url {
        let mut url = self.collection.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                project,
                "_apis",
                "git",
                "repositories",
                repository,
                "items",
                "items",
            ]);
        }
        url.query_pairs_mut()
            .append_pair("path", "/")
            .append_pair("versionDescriptor[version]", branch)
            .append_pair("$format", "zip");
        url
    }

    /// URL of the resource-area discovery endpoint.
    pub fn resource_areas_url(&self) -> Url {
        let mut url = self.collection.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["_apis", "ResourceAreas"]);
        }
        url
    }
}

/// Builds the Basic authorization value Azure DevOps expects for a PAT.
#[must_use]
pub fn basic_authorization(token: &SecretString) -> SecretString {
    let encoded = STANDARD.encode(format!(":{}", token.expose_secret()));
    SecretString::from(format!("Basic {encoded}"))
}

/// Thin HTTP client for the calls made outside the SDK.
#[derive(Clone)]
pub struct AzureHttpClient {
    http: reqwest::Client,
    authorization: SecretString,
}

impl AzureHttpClient {
    pub fn new(token: &SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            authorization: basic_authorization(token),
        }
    }

    /// Downloads the archive at `url` and returns its bytes.
    pub async fn download_archive(&self, url: Url) -> VcsResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.authorization.expose_secret(),
            )
            .header("download", "true")
            .header("resolveLfs", "true")
            .send()
            .await
            .map_err(|e| VcsError::from_transport(&e))?;
        let response = check_status(response, "repository archive").await?;

        let body = response.bytes().await.map_err(|e| VcsError::Transient {
            message: format!("failed to read repository archive: {e}"),
        })?;
        Ok(body.to_vec())
    }

    /// Issues the resource-area discovery call, succeeding only for accepted credentials.
    pub async fn get_resource_areas(&self, url: Url) -> VcsResult<()> {
        let response = self
            .http
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.authorization.expose_secret(),
            )
            .send()
            .await
            .map_err(|e| VcsError::from_transport(&e))?;
        check_status(response, "resource areas").await?;
        Ok(())
    }
}

/// Fails non-2xx responses with a classified error.
///
/// Azure DevOps answers rejected PATs on some routes with `203` and an HTML
/// sign-in page, which is treated as an authentication failure.
async fn check_status(response: reqwest::Response, what: &str) -> VcsResult<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
        return Err(VcsError::Auth {
            message: format!("{what}: credentials were not accepted"),
        });
    }
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("{what}: bad HTTP status {}", status.as_u16())
    } else {
        format!("{what}: bad HTTP status {}: {}", status.as_u16(), body.trim())
    };
    Err(VcsError::from_status(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Cloud Endpoint Parsing
    ///
    /// Tests splitting a dev.azure.com endpoint.
    ///
    /// ## Test Scenario
    /// - Parses an endpoint with and without the trailing slash
    ///
    /// ## Expected Outcome
    /// - Base is the host, organization is the last segment
    #[test]
    fn test_parse_cloud_endpoint() {
        for input in ["https://dev.azure.com/my-org/", "https://dev.azure.com/my-org"] {
            let endpoint = AzureEndpoint::parse(input).unwrap();
            assert_eq!(endpoint.organization(), "my-org");
            assert_eq!(endpoint.base().as_str(), "https://dev.azure.com/");
            assert_eq!(endpoint.collection().as_str(), "https://dev.azure.com/my-org");
        }
    }

    /// # On-Premises Endpoint Parsing
    ///
    /// Tests splitting a collection URL with a virtual directory.
    ///
    /// ## Test Scenario
    /// - Parses https://tfs.corp/tfs/DefaultCollection
    ///
    /// ## Expected Outcome
    /// - Base keeps the virtual directory, organization is the collection
    #[test]
    fn test_parse_on_prem_endpoint() {
        let endpoint = AzureEndpoint::parse("https://tfs.corp/tfs/DefaultCollection").unwrap();
        assert_eq!(endpoint.organization(), "DefaultCollection");
        assert_eq!(endpoint.base().as_str(), "https://tfs.corp/tfs");
    }

    /// # Invalid Endpoints
    ///
    /// Tests rejection of unusable endpoints.
    ///
    /// ## Test Scenario
    /// - Parses a non-URL and a URL without organization
    ///
    /// ## Expected Outcome
    /// - Both fail with a validation error
    #[test]
    fn test_parse_invalid_endpoints() {
        assert!(matches!(
            AzureEndpoint::parse("not a url"),
            Err(VcsError::Validation { .. })
        ));
        assert!(matches!(
            AzureEndpoint::parse("https://dev.azure.com/"),
            Err(VcsError::Validation { .. })
        ));
    }

    /// # Archive URL
    ///
    /// Tests the archive download URL layout.
    ///
    /// ## Test Scenario
    /// - Builds the URL for project/repo/branch
    ///
    /// ## Expected Outcome
    /// - Path targets the items route, query asks for a zip of the branch
    #[test]
    fn test_archive_url() {
        let endpoint = AzureEndpoint::parse("https://dev.azure.com/org/").unwrap();
        let url = endpoint.archive_url("proj", "repo", "main");

        assert_eq!(
            url.path(),
            "/org/proj/_apis/git/repositories/repo/items/items"
        );
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("path".to_string(), "/".to_string()),
                ("versionDescriptor[version]".to_string(), "main".to_string()),
                ("$format".to_string(), "zip".to_string()),
            ]
        );
    }

    /// # Resource Areas URL
    ///
    /// Tests the connection check URL.
    ///
    /// ## Test Scenario
    /// - Builds the URL for a cloud endpoint
    ///
    /// ## Expected Outcome
    /// - Path is /{org}/_apis/ResourceAreas
    #[test]
    fn test_resource_areas_url() {
        let endpoint = AzureEndpoint::parse("https://dev.azure.com/org").unwrap();
        assert_eq!(
            endpoint.resource_areas_url().as_str(),
            "https://dev.azure.com/org/_apis/ResourceAreas"
        );
    }

    /// # Basic Authorization Header
    ///
    /// Tests encoding of the PAT as Basic credentials with an empty user.
    ///
    /// ## Test Scenario
    /// - Encodes the token "pat"
    ///
    /// ## Expected Outcome
    /// - Value is "Basic " + base64(":pat")
    #[test]
    fn test_basic_authorization() {
        let header = basic_authorization(&SecretString::from("pat".to_string()));
        assert_eq!(header.expose_secret(), "Basic OnBhdA==");
    }
}

//! HubSpot adapter. Implements CrmPort via the HubSpot CRM v3 REST API.

use crate::domain::{DomainError, PropertyDefinition, RecordPage};
use crate::ports::CrmPort;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// HubSpot CRM adapter for one object type.
///
/// Requires a private app token with CRM object scopes. All calls share the
/// same bearer token, supplied at construction.
pub struct HubSpotAdapter {
    client: Client,
    base_url: String,
    token: String,
    object_type: String,
}

impl HubSpotAdapter {
    /// Create a new HubSpot adapter.
    ///
    /// # Arguments
    /// * `base_url` - API root without trailing slash (e.g. "https://api.hubapi.com")
    /// * `token` - Private app access token
    /// * `object_type` - CRM object type records are written to (e.g. "deals", "tasks")
    pub fn new(base_url: String, token: String, object_type: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token,
            object_type,
        }
    }

    fn objects_url(&self) -> String {
        format!("{}/crm/v3/objects/{}", self.base_url, self.object_type)
    }

    fn owners_url(&self) -> String {
        format!("{}/crm/v3/owners/", self.base_url)
    }

    fn properties_url(&self) -> String {
        format!("{}/crm/v3/properties/{}", self.base_url, self.object_type)
    }
}

/// Turn a non-2xx response into `DomainError::Crm`, keeping a prefix of the body.
async fn ensure_success(res: Response, action: &str) -> Result<Response, DomainError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
    warn!(status = %status, action, "HubSpot API returned error");
    Err(DomainError::Crm(format!(
        "HubSpot API error {} ({}): {}",
        status,
        action,
        text.chars().take(300).collect::<String>()
    )))
}

/// Only the parts of a list response the cursor loop needs. Entries are kept
/// as raw values so one malformed result does not sink the whole page.
#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
    #[serde(default)]
    paging: Option<Value>,
}

/// HubSpot sends ids and cursors as strings, but numbers show up in older payloads.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Parse a list-objects response body into a page of ids plus the next cursor.
pub(crate) fn parse_list_response(body: &str) -> Result<RecordPage, DomainError> {
    if body.trim().is_empty() {
        return Err(DomainError::Crm(
            "HubSpot list response body was empty".to_string(),
        ));
    }
    let parsed: ListResponse = serde_json::from_str(body)
        .map_err(|e| DomainError::Crm(format!("Failed to parse list response: {}", e)))?;

    let ids = parsed
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| r.get("id").cloned())
        .filter_map(value_to_string)
        .collect();
    let next_after = parsed
        .paging
        .as_ref()
        .and_then(|p| p.pointer("/next/after"))
        .cloned()
        .and_then(value_to_string);

    Ok(RecordPage { ids, next_after })
}

#[async_trait::async_trait]
impl CrmPort for HubSpotAdapter {
    async fn create_record(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<String, DomainError> {
        let body = serde_json::json!({ "properties": properties });

        let res = self
            .client
            .post(self.objects_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Crm(format!("Request failed: {}", e)))?;
        let res = ensure_success(res, "create record").await?;

        res.text()
            .await
            .map_err(|e| DomainError::Crm(format!("Failed to read create response: {}", e)))
    }

    async fn list_records(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<RecordPage, DomainError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }

        let res = self
            .client
            .get(self.objects_url())
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| DomainError::Crm(format!("Request failed: {}", e)))?;
        let res = ensure_success(res, "list records").await?;

        let body = res
            .text()
            .await
            .map_err(|e| DomainError::Crm(format!("Failed to read list response: {}", e)))?;
        let page = parse_list_response(&body)?;
        debug!(
            object_type = %self.object_type,
            ids = page.ids.len(),
            has_next = page.next_after.is_some(),
            "fetched record page"
        );
        Ok(page)
    }

    async fn delete_record(&self, record_id: &str) -> Result<u16, DomainError> {
        let url = format!("{}/{}", self.objects_url(), record_id);
        let res = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DomainError::Crm(format!("Request failed: {}", e)))?;
        Ok(res.status().as_u16())
    }

    async fn list_owners(&self) -> Result<String, DomainError> {
        let res = self
            .client
            .get(self.owners_url())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DomainError::Crm(format!("Request failed: {}", e)))?;
        let res = ensure_success(res, "list owners").await?;

        res.text()
            .await
            .map_err(|e| DomainError::Crm(format!("Failed to read owners response: {}", e)))
    }

    async fn create_property(
        &self,
        definition: &PropertyDefinition,
    ) -> Result<String, DomainError> {
        let res = self
            .client
            .post(self.properties_url())
            .bearer_auth(&self.token)
            .json(definition)
            .send()
            .await
            .map_err(|e| DomainError::Crm(format!("Request failed: {}", e)))?;
        let res = ensure_success(res, "create property").await?;

        res.text()
            .await
            .map_err(|e| DomainError::Crm(format!("Failed to read property response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn adapter(base_url: String) -> HubSpotAdapter {
        HubSpotAdapter::new(base_url, "pat-test".to_string(), "deals".to_string())
    }

    #[test]
    fn test_parse_list_response_with_cursor() {
        let body = r#"{
            "results": [{"id": "101", "properties": {}}, {"id": 102}, {"properties": {}}],
            "paging": {"next": {"after": "102", "link": "https://..."}}
        }"#;
        let page = parse_list_response(body).unwrap();
        assert_eq!(page.ids, vec!["101", "102"]);
        assert_eq!(page.next_after.as_deref(), Some("102"));
    }

    #[test]
    fn test_parse_list_response_skips_malformed_entries() {
        let body = r#"{
            "results": ["oops", 7, null, [1], {"id": "55"}, {"id": null}],
            "paging": {"next": {"after": 55}}
        }"#;
        let page = parse_list_response(body).unwrap();
        assert_eq!(page.ids, vec!["55"]);
        assert_eq!(page.next_after.as_deref(), Some("55"));

        let page = parse_list_response(r#"{"results": null, "paging": null}"#).unwrap();
        assert!(page.ids.is_empty());
        assert_eq!(page.next_after, None);
    }

    #[test]
    fn test_parse_list_response_last_page() {
        let page = parse_list_response(r#"{"results": [{"id": "9"}]}"#).unwrap();
        assert_eq!(page.ids, vec!["9"]);
        assert_eq!(page.next_after, None);
    }

    #[test]
    fn test_parse_list_response_empty_body() {
        let err = parse_list_response("  ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_create_record_posts_properties() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/crm/v3/objects/deals")
            .match_header("authorization", "Bearer pat-test")
            .match_body(Matcher::Json(serde_json::json!({
                "properties": {
                    "ai_systems_description": "Follow up with client",
                    "ai_systems_priority": "HIGH"
                }
            })))
            .with_status(201)
            .with_body(r#"{"id":"555","properties":{}}"#)
            .create_async()
            .await;

        let mut props = BTreeMap::new();
        props.insert(
            "ai_systems_description".to_string(),
            "Follow up with client".to_string(),
        );
        props.insert("ai_systems_priority".to_string(), "HIGH".to_string());

        let body = adapter(server.url()).create_record(&props).await.unwrap();
        assert!(body.contains("555"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_record_error_status_is_err() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/crm/v3/objects/deals")
            .with_status(400)
            .with_body(r#"{"message":"Property values were not valid"}"#)
            .create_async()
            .await;

        let err = adapter(server.url())
            .create_record(&BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Crm(ref m) if m.contains("400") && m.contains("not valid")));
    }

    #[tokio::test]
    async fn test_list_records_sends_limit_and_cursor() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/crm/v3/objects/deals")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("after".into(), "abc".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"results":[{"id":"1"},{"id":"2"}]}"#)
            .create_async()
            .await;

        let page = adapter(server.url())
            .list_records(Some("abc"), 100)
            .await
            .unwrap();
        assert_eq!(page.ids, vec!["1", "2"]);
        assert!(page.next_after.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_record_returns_status() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("DELETE", "/crm/v3/objects/deals/1")
            .with_status(204)
            .create_async()
            .await;
        let _missing = server
            .mock("DELETE", "/crm/v3/objects/deals/2")
            .with_status(404)
            .create_async()
            .await;

        let hubspot = adapter(server.url());
        assert_eq!(hubspot.delete_record("1").await.unwrap(), 204);
        assert_eq!(hubspot.delete_record("2").await.unwrap(), 404);
    }

    #[tokio::test]
    async fn test_create_property_targets_object_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/crm/v3/properties/deals")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "name": "prioridad_1",
                "type": "enumeration",
                "fieldType": "select"
            })))
            .with_status(201)
            .with_body(r#"{"name":"prioridad_1"}"#)
            .create_async()
            .await;

        let def = PropertyDefinition::priority_select("prioridad_1", "dealinformation");
        let body = adapter(server.url()).create_property(&def).await.unwrap();
        assert!(body.contains("prioridad_1"));
        mock.assert_async().await;
    }
}

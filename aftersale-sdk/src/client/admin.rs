//! Admin API client.

use url::Url;
use uuid::Uuid;

use super::{ClientError, decode};
use crate::objects::admin::{
    AdminComplaintResponse, ListComplaintsQuery, ResolveComplaintRequest,
};
use crate::objects::notifications::{BulkNotificationRequest, BulkNotificationResult};

/// Client for the admin console endpoints, authenticated by a staff or
/// super_admin bearer session token.
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: String,
}

impl AdminClient {
    pub fn new(base_url: Url, bearer_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bearer_token: bearer_token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// `GET /api/admin/complaints`
    pub async fn list_complaints(
        &self,
        query: &ListComplaintsQuery,
    ) -> Result<Vec<AdminComplaintResponse>, ClientError> {
        let url = self.endpoint("api/admin/complaints")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/admin/complaints/{complaint_id}/resolve`
    pub async fn resolve_complaint(
        &self,
        complaint_id: Uuid,
        request: &ResolveComplaintRequest,
    ) -> Result<AdminComplaintResponse, ClientError> {
        let url = self.endpoint(&format!("api/admin/complaints/{complaint_id}/resolve"))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/admin/complaints/{complaint_id}/mark-refunded`
    pub async fn mark_refunded(
        &self,
        complaint_id: Uuid,
    ) -> Result<AdminComplaintResponse, ClientError> {
        let url = self.endpoint(&format!(
            "api/admin/complaints/{complaint_id}/mark-refunded"
        ))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/admin/notifications/bulk` (super_admin only)
    pub async fn bulk_notify(
        &self,
        request: &BulkNotificationRequest,
    ) -> Result<BulkNotificationResult, ClientError> {
        let url = self.endpoint("api/admin/notifications/bulk")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }
}

//! Customer API client.

use url::Url;
use uuid::Uuid;

use super::{ClientError, decode};
use crate::objects::cancellation::{
    CancellationCodeIssued, CancellationConfirmed, ConfirmCancellationRequest,
    RequestCancellationCode,
};
use crate::objects::complaints::{
    ComplaintResponse, RefundRequestResponse, ReportIssueRequest, SelectRefundMethodRequest,
};
use crate::objects::RefundMethod;

/// Client for the customer-facing endpoints, authenticated by a bearer
/// session token.
pub struct CustomerClient {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: String,
}

impl CustomerClient {
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

    /// `POST /api/customer/orders/{order_id}/cancellation`
    pub async fn request_cancellation(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<CancellationCodeIssued, ClientError> {
        let url = self.endpoint(&format!("api/customer/orders/{order_id}/cancellation"))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(&RequestCancellationCode { reason })
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/customer/orders/{order_id}/cancellation/confirm`
    pub async fn confirm_cancellation(
        &self,
        order_id: Uuid,
        code: impl Into<String>,
    ) -> Result<CancellationConfirmed, ClientError> {
        let url = self.endpoint(&format!(
            "api/customer/orders/{order_id}/cancellation/confirm"
        ))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(&ConfirmCancellationRequest { code: code.into() })
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/customer/orders/{order_id}/complaints`
    pub async fn report_issue(
        &self,
        order_id: Uuid,
        request: &ReportIssueRequest,
    ) -> Result<ComplaintResponse, ClientError> {
        let url = self.endpoint(&format!("api/customer/orders/{order_id}/complaints"))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /api/customer/complaints/{complaint_id}`
    pub async fn get_complaint(
        &self,
        complaint_id: Uuid,
    ) -> Result<ComplaintResponse, ClientError> {
        let url = self.endpoint(&format!("api/customer/complaints/{complaint_id}"))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/customer/complaints/{complaint_id}/refund-method`
    pub async fn select_refund_method(
        &self,
        complaint_id: Uuid,
        method: RefundMethod,
    ) -> Result<ComplaintResponse, ClientError> {
        let url = self.endpoint(&format!(
            "api/customer/complaints/{complaint_id}/refund-method"
        ))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(&SelectRefundMethodRequest { method })
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/customer/refund-requests/{refund_request_id}/refund-method`
    pub async fn select_cancellation_refund_method(
        &self,
        refund_request_id: Uuid,
        method: RefundMethod,
    ) -> Result<RefundRequestResponse, ClientError> {
        let url = self.endpoint(&format!(
            "api/customer/refund-requests/{refund_request_id}/refund-method"
        ))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(&SelectRefundMethodRequest { method })
            .send()
            .await?;
        decode(response).await
    }
}

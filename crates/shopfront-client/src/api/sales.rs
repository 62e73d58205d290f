//! Sale lifecycle: create, update, complete, cancel, listings and receipts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopfront_core::{CheckoutPayload, Id, SaleStatus};
use tracing::info;

use super::ApiClient;
use crate::error::ClientResult;
use crate::transport::ApiRequest;

/// A sale record. Only the fields the POS reads are typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Id,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        u64::from(self.current_page) * u64::from(self.per_page) < self.total
    }
}

#[derive(Serialize)]
struct NewSale<'a> {
    #[serde(flatten)]
    payload: &'a CheckoutPayload,
    status: SaleStatus,
}

impl ApiClient {
    /// Records a sale from a checkout payload.
    pub async fn create_sale(
        &self,
        payload: &CheckoutPayload,
        status: SaleStatus,
    ) -> ClientResult<Sale> {
        let request = ApiRequest::post("/sales").json(&NewSale { payload, status })?;
        let sale: Sale = self.fetch(request, "sale").await?;
        info!(sale_id = %sale.id, ?status, "Sale created");
        Ok(sale)
    }

    /// Replaces a pending sale's contents.
    pub async fn update_sale(&self, id: &Id, payload: &CheckoutPayload) -> ClientResult<Sale> {
        let request = ApiRequest::put(format!("/sales/{}", id)).json(payload)?;
        self.fetch(request, "sale").await
    }

    /// Finalizes a sale with its payment details.
    pub async fn complete_sale<P: Serialize + ?Sized>(
        &self,
        id: &Id,
        payment: &P,
    ) -> ClientResult<Sale> {
        let request = ApiRequest::post(format!("/sales/{}/complete", id)).json(payment)?;
        let sale: Sale = self.fetch(request, "sale").await?;
        info!(sale_id = %sale.id, "Sale completed");
        Ok(sale)
    }

    pub async fn cancel_sale(&self, id: &Id) -> ClientResult<()> {
        self.send_envelope(ApiRequest::patch(format!("/sales/{}/cancel", id)))
            .await?;
        info!(sale_id = %id, "Sale cancelled");
        Ok(())
    }

    pub async fn sale(&self, id: &Id) -> ClientResult<Sale> {
        self.fetch(ApiRequest::get(format!("/sales/{}", id)), "sale")
            .await
    }

    pub async fn sales(&self, page: u32, per_page: u32) -> ClientResult<Page<Sale>> {
        self.list("/sales", page, per_page).await
    }

    pub async fn pending_sales(&self, page: u32, per_page: u32) -> ClientResult<Page<Sale>> {
        self.list("/sales/pending", page, per_page).await
    }

    pub async fn completed_sales(&self, page: u32, per_page: u32) -> ClientResult<Page<Sale>> {
        self.list("/sales/completed", page, per_page).await
    }

    /// Aggregate figures for the dashboard, passed through as sent.
    pub async fn sales_summary(&self) -> ClientResult<Map<String, Value>> {
        self.fetch(ApiRequest::get("/sales/summary"), "summary")
            .await
    }

    /// Receipt data for printing: every field of the response envelope.
    pub async fn receipt(&self, id: &Id) -> ClientResult<Map<String, Value>> {
        let envelope = self
            .send_envelope(ApiRequest::get(format!("/sales/{}/receipt", id)))
            .await?;
        Ok(envelope.fields)
    }

    async fn list(&self, path: &str, page: u32, per_page: u32) -> ClientResult<Page<Sale>> {
        let request = ApiRequest::get(path)
            .query("page", page.max(1))
            .query("per_page", per_page);
        self.fetch(request, "sales").await
    }
}

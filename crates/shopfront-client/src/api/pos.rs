//! POS screen calls: item search, barcode scan, stock checks and held sales.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopfront_core::{CheckoutPayload, Id, InventoryRecord};
use tracing::{debug, warn};

use super::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::ApiRequest;

/// A sale parked for later, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldSale {
    pub id: Id,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ApiClient {
    /// Searches stock at a location. A blank keyword returns nothing without
    /// calling the backend; a "no results" rejection is an empty list.
    pub async fn search_items(
        &self,
        location_id: &Id,
        keyword: &str,
    ) -> ClientResult<Vec<InventoryRecord>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        match self.send_envelope(search_request(location_id, keyword)).await {
            Ok(mut envelope) => Ok(envelope.take_optional("inventories")?.unwrap_or_default()),
            Err(ClientError::Rejected(message)) => {
                debug!(%message, "Item search returned no results");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Looks up a scanned barcode. `None` when nothing matches.
    pub async fn scan_barcode(
        &self,
        location_id: &Id,
        barcode: &str,
    ) -> ClientResult<Option<InventoryRecord>> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Ok(None);
        }

        let found: Option<Value> = match self.send_envelope(search_request(location_id, barcode)).await {
            Ok(mut envelope) => envelope.take_optional("inventories")?,
            Err(ClientError::Rejected(message)) => {
                debug!(%message, barcode, "Barcode not found");
                None
            }
            Err(err) => return Err(err),
        };

        // The search endpoint answers with a list; older builds sent one record.
        let record = match found {
            Some(Value::Array(records)) => records.into_iter().next(),
            other => other,
        };
        record
            .map(serde_json::from_value)
            .transpose()
            .map_err(ClientError::from)
    }

    /// Units of an item available at a location. Any failure counts as 0.
    pub async fn check_stock(&self, item_id: &Id, location_id: &Id) -> i64 {
        let request = ApiRequest::get("/pos/stock/check")
            .query("item_id", item_id)
            .query("location_id", location_id);

        match self.send_envelope(request).await {
            Ok(mut envelope) => match envelope.take_optional::<Value>("stock") {
                Ok(Some(stock)) => stock_quantity(&stock),
                Ok(None) => 0,
                Err(err) => {
                    warn!(error = %err, "Unreadable stock level");
                    0
                }
            },
            Err(err) => {
                warn!(item_id = %item_id, error = %err, "Failed to check stock");
                0
            }
        }
    }

    /// Parks the current cart.
    pub async fn hold_sale(&self, payload: &CheckoutPayload) -> ClientResult<HeldSale> {
        let request = ApiRequest::post("/pos/hold").json(payload)?;
        self.fetch(request, "held_sale").await
    }

    pub async fn held_sales(&self) -> ClientResult<Vec<HeldSale>> {
        let mut envelope = self.send_envelope(ApiRequest::get("/pos/held-sales")).await?;
        Ok(envelope.take_optional("held_sales")?.unwrap_or_default())
    }

    pub async fn retrieve_held_sale(&self, id: &Id) -> ClientResult<HeldSale> {
        self.fetch(ApiRequest::get(format!("/pos/held-sales/{}", id)), "held_sale")
            .await
    }

    pub async fn delete_held_sale(&self, id: &Id) -> ClientResult<()> {
        self.send_envelope(ApiRequest::delete(format!("/pos/held-sales/{}", id)))
            .await?;
        Ok(())
    }
}

fn search_request(location_id: &Id, keyword: &str) -> ApiRequest {
    ApiRequest::get("/inventories/search")
        .query("location_id", location_id)
        .query("keyword", keyword)
}

/// Stock arrives as an integer, a float or a numeric string.
fn stock_quantity(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.trunc() as i64)
            .unwrap_or(0),
        _ => 0,
    }
}

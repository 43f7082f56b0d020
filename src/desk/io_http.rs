// The petition server over HTTP.

use std::collections::BTreeMap;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::desk::config_reader::DeskSettings;
use crate::desk::server::*;
use crate::desk::*;

pub struct HttpSheetServer {
    base_url: String,
    http_client: Client,
}

impl HttpSheetServer {
    pub fn new(settings: &DeskSettings) -> DeskResult<HttpSheetServer> {
        let http_client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .build()
            .context(BuildingClientSnafu {})?;
        Ok(HttpSheetServer {
            base_url: settings.server_url.clone(),
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> DeskResult<T> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .context(RequestSnafu { url: url.clone() })?;
        read_json(&url, response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> DeskResult<T> {
        let url = self.url(path);
        let mut request = self.http_client.post(&url);
        if let Some(b) = body {
            request = request.json(b);
        }
        debug!("POST {}", url);
        let response = request.send().context(RequestSnafu { url: url.clone() })?;
        read_json(&url, response)
    }

    fn post_for_reply<B: Serialize>(&self, path: &str, body: Option<&B>) -> DeskResult<ServerReply> {
        let reply: ServerReply = self.post_json(path, body)?;
        expect_success(&self.url(path), reply)
    }

    fn post_for_batch<B: Serialize>(&self, path: &str, body: Option<&B>) -> DeskResult<u64> {
        let reply = self.post_for_reply(path, body)?;
        reply.batch_id.context(MissingReplyFieldSnafu {
            url: self.url(path),
            field: "batch_id",
        })
    }
}

fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> DeskResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        // The server explains itself with {"error": ...} when it can.
        let message = serde_json::from_str::<ServerReply>(&body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or(body);
        warn!("{} answered {}: {}", url, status, message);
        return ServerStatusSnafu {
            status: status.as_u16(),
            url,
            message,
        }
        .fail();
    }
    response.json::<T>().context(DecodingResponseSnafu { url })
}

fn expect_success(url: &str, reply: ServerReply) -> DeskResult<ServerReply> {
    if let Some(message) = reply.error.clone() {
        return RefusedSnafu { url, message }.fail();
    }
    if reply.success == Some(false) {
        return RefusedSnafu {
            url,
            message: "the request was not accepted",
        }
        .fail();
    }
    Ok(reply)
}

impl SheetServer for HttpSheetServer {
    fn row_numbers(&self, sheet_id: &str) -> DeskResult<Option<Vec<i64>>> {
        let reply: RowNumbersReply =
            self.get_json("/sheets/row_numbers", &[("sheet_id", sheet_id.to_string())])?;
        Ok(reply.row_numbers)
    }

    fn verify(&self, record: &SignatureRecord) -> DeskResult<String> {
        let payload = VerifyPayload::from(record);
        let reply = self.post_for_reply("/signatures/verify", Some(&payload))?;
        Ok(reply.message.unwrap_or_else(|| "recorded".to_string()))
    }

    fn update_sheet_status(&self, sheet: u64, status: SheetStatus) -> DeskResult<()> {
        let body = StatusUpdateRequest {
            sheet_number: sheet,
            new_status: status.as_str().to_string(),
        };
        self.post_for_reply("/sheets/update_sheet_status", Some(&body))?;
        Ok(())
    }

    fn close_sheet(&self, request: &CloseSheetRequest) -> DeskResult<()> {
        self.post_for_reply("/sheets/close_sheet", Some(request))?;
        Ok(())
    }

    fn notaries(&self) -> DeskResult<Vec<NamedRef>> {
        self.get_json("/sheets/notaries", &[])
    }

    fn circulators(&self) -> DeskResult<Vec<NamedRef>> {
        self.get_json("/sheets/circulators", &[])
    }

    fn add_to_batch(&self, sheet: u64) -> DeskResult<u64> {
        self.post_for_batch("/batches/add_to_batch", Some(&AddToBatchRequest { sheet_id: sheet }))
    }

    fn close_batch(&self) -> DeskResult<u64> {
        self.post_for_batch::<serde_json::Value>("/batches/close_batch", None)
    }

    fn ship_batch(&self, request: &ShipmentRequest) -> DeskResult<u64> {
        self.post_for_batch("/batches/ship_batch", Some(request))
    }

    fn signature_stats(&self) -> DeskResult<BTreeMap<String, u64>> {
        self.get_json("/signatures/stats", &[])
    }

    fn sheet_entries(&self, sheet: u64) -> DeskResult<Vec<SheetEntry>> {
        let reply: SheetEntriesReply =
            self.get_json("/fetch_data", &[("sheet", sheet.to_string())])?;
        Ok(reply.into_entries())
    }

    fn search(&self, query: &SearchQuery) -> DeskResult<Vec<VoterResult>> {
        let reply: SearchReply = self.post_json("/advanced_search/", Some(query))?;
        let results = reply.into_results();
        debug!("search: {} results", results.len());
        Ok(results)
    }
}

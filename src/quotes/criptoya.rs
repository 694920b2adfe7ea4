use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::quotes::timestamp_to_utc;
use crate::quotes::types::{Quote, QuoteSource};

/// One CriptoYa exchange endpoint, e.g. `https://criptoya.com/api/binancep2p/USDT/BOB/500`.
pub struct CriptoyaSource {
    id: String,
    url_prefix: String,
    client: Client,
    timeout: Duration,
}

impl CriptoyaSource {
    pub fn new(id: &str, api_base: &str, asset: &str, fiat: &str, client: Client) -> Self {
        let url_prefix = format!("{}/{}/{}/{}", api_base.trim_end_matches('/'), id, asset, fiat);
        Self {
            id: id.to_string(),
            url_prefix,
            client,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url_for(&self, volume: u32) -> String {
        format!("{}/{}", self.url_prefix, volume)
    }
}

#[async_trait]
impl QuoteSource for CriptoyaSource {
    async fn fetch_quote(&self, volume: u32) -> Result<Quote> {
        let url = self.url_for(volume);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("{} http get", self.id))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("{} responded with {status}", self.id);
        }

        let body = resp
            .text()
            .await
            .with_context(|| format!("{} http .text()", self.id))?;
        parse_quote(&self.id, &body)
    }

    fn name(&self) -> &str {
        &self.id
    }
}

/// Parse one CriptoYa response body. Errors when the body is not JSON or when
/// neither side carries a positive price.
pub fn parse_quote(source: &str, body: &str) -> Result<Quote> {
    let v: Value =
        serde_json::from_str(body).with_context(|| format!("{source}: body is not JSON"))?;

    let ask = price_field(v.get("ask"));
    let bid = price_field(v.get("bid"));
    if ask <= 0.0 && bid <= 0.0 {
        bail!("{source}: empty quote (ask={ask}, bid={bid})");
    }

    let observed_at = timestamp_to_utc(number_field(v.get("time")).unwrap_or(0.0));

    Ok(Quote {
        source: source.to_string(),
        ask,
        bid,
        observed_at,
    })
}

fn number_field(v: Option<&Value>) -> Option<f64> {
    match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

// Absent, null or garbage prices count as 0 rather than failing the source.
fn price_field(v: Option<&Value>) -> f64 {
    number_field(v).unwrap_or(0.0)
}

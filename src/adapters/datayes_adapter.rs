//! DataYes (wmcloud) market data adapter.
//!
//! Daily equity bars come from `getMktEqudCCXE.json`, authenticated with a
//! bearer token. Only the trade date, close price and short name are used.

use crate::domain::error::SmacrossError;
use crate::domain::price_series::{Instrument, InstrumentHistory, PriceObservation, PriceSeries};
use crate::domain::security_id::to_security_id;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.wmcloud.com/data/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const TOKEN_ENV_VAR: &str = "DATAYES_TOKEN";
const DAILY_BARS_PATH: &str = "/api/equity/getMktEqudCCXE.json";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "retCode", default)]
    ret_code: Option<i64>,
    #[serde(rename = "retMsg", default)]
    ret_msg: Option<String>,
    data: Option<Vec<ApiBar>>,
}

#[derive(Debug, Deserialize)]
struct ApiBar {
    #[serde(rename = "secShortName", default)]
    sec_short_name: Option<String>,
    #[serde(rename = "tradeDate")]
    trade_date: String,
    #[serde(rename = "closePrice")]
    close_price: Option<f64>,
}

pub struct DataYesAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl DataYesAdapter {
    pub fn new(token: &str, base_url: &str, timeout: Duration) -> Result<Self, SmacrossError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            SmacrossError::ConfigInvalid {
                section: "api".into(),
                key: "token".into(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from `[api]` settings. An explicit token wins over the config file,
    /// which wins over the `DATAYES_TOKEN` environment variable.
    pub fn from_config(
        config: &dyn ConfigPort,
        token_override: Option<&str>,
    ) -> Result<Self, SmacrossError> {
        let token = token_override
            .map(str::to_string)
            .or_else(|| config.get_string("api", "token"))
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: "api".into(),
                key: "token".into(),
            })?;

        let base_url = config
            .get_string("api", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = config.get_int("api", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64);
        if timeout_secs <= 0 {
            return Err(SmacrossError::ConfigInvalid {
                section: "api".into(),
                key: "timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }

        Self::new(&token, &base_url, Duration::from_secs(timeout_secs as u64))
    }
}

impl HistoryPort for DataYesAdapter {
    fn fetch_history(&self, code: &str) -> Result<InstrumentHistory, SmacrossError> {
        let security_id = to_security_id(code)?;
        let url = format!("{}{}", self.base_url, DAILY_BARS_PATH);

        tracing::info!(code, security_id = %security_id, "fetching price history");
        let body = self
            .client
            .get(&url)
            .query(&[("secID", security_id.as_str())])
            .send()?
            .error_for_status()?
            .text()?;

        parse_history_response(code, &body)
    }
}

/// Parse a `getMktEqudCCXE` response body into a date-sorted history.
pub fn parse_history_response(code: &str, body: &str) -> Result<InstrumentHistory, SmacrossError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| SmacrossError::DataFormat {
            reason: format!("invalid response for {}: {}", code, e),
        })?;

    let bars = match response.data {
        Some(bars) => bars,
        None => {
            return Err(SmacrossError::Api {
                message: format!(
                    "{} (retCode {})",
                    response
                        .ret_msg
                        .unwrap_or_else(|| "response carried no data".into()),
                    response.ret_code.map_or("?".to_string(), |c| c.to_string())
                ),
            });
        }
    };

    let mut name = None;
    let mut observations = Vec::with_capacity(bars.len());
    for bar in bars {
        let Some(close) = bar.close_price else {
            tracing::debug!(code, date = %bar.trade_date, "skipping bar without close price");
            continue;
        };
        let date = NaiveDate::parse_from_str(&bar.trade_date, "%Y-%m-%d").map_err(|e| {
            SmacrossError::DataFormat {
                reason: format!("invalid tradeDate {:?} for {}: {}", bar.trade_date, code, e),
            }
        })?;
        if !close.is_finite() {
            return Err(SmacrossError::DataFormat {
                reason: format!("non-finite closePrice on {} for {}", bar.trade_date, code),
            });
        }
        if name.is_none() {
            name = bar.sec_short_name;
        }
        observations.push(PriceObservation { date, close });
    }

    let series = PriceSeries::new(observations)?;
    Ok(InstrumentHistory {
        instrument: Instrument {
            id: code.to_string(),
            name: name.unwrap_or_default(),
        },
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const SAMPLE: &str = r#"{
        "retCode": 1,
        "retMsg": "Success",
        "data": [
            {"secID": "000001.XSHE", "secShortName": "PAYH", "tradeDate": "2024-01-03", "closePrice": 9.2},
            {"secID": "000001.XSHE", "secShortName": "PAYH", "tradeDate": "2024-01-02", "closePrice": 9.4},
            {"secID": "000001.XSHE", "secShortName": "PAYH", "tradeDate": "2024-01-04", "closePrice": null}
        ]
    }"#;

    #[test]
    fn parses_and_sorts_bars() {
        let history = parse_history_response("000001", SAMPLE).unwrap();

        assert_eq!(history.instrument.id, "000001");
        assert_eq!(history.instrument.name, "PAYH");
        assert_eq!(history.series.closes(), vec![9.4, 9.2]);
        assert_eq!(
            history.series.earliest_date(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn missing_data_reports_ret_msg() {
        let body = r#"{"retCode": -403, "retMsg": "Need privilege"}"#;
        let err = parse_history_response("000001", body).unwrap_err();
        match err {
            SmacrossError::Api { message } => {
                assert!(message.contains("Need privilege"));
                assert!(message.contains("-403"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn empty_data_is_insufficient_history() {
        let body = r#"{"retCode": 1, "retMsg": "Success", "data": []}"#;
        let err = parse_history_response("000001", body).unwrap_err();
        assert!(matches!(err, SmacrossError::InsufficientHistory { .. }));
    }

    #[test]
    fn malformed_json_is_data_format() {
        let err = parse_history_response("000001", "<html>").unwrap_err();
        assert!(matches!(err, SmacrossError::DataFormat { .. }));
    }

    #[test]
    fn bad_trade_date_is_data_format() {
        let body = r#"{"data": [{"tradeDate": "20240102", "closePrice": 1.0}]}"#;
        let err = parse_history_response("000001", body).unwrap_err();
        assert!(matches!(err, SmacrossError::DataFormat { .. }));
    }

    #[test]
    fn out_of_range_close_is_data_format() {
        let body = r#"{"data": [{"tradeDate": "2024-01-02", "closePrice": 1e400}]}"#;
        let err = parse_history_response("000001", body).unwrap_err();
        assert!(matches!(err, SmacrossError::DataFormat { .. }));
    }

    #[test]
    fn from_config_uses_token_override() {
        let config = FileConfigAdapter::from_string("[api]\n").unwrap();
        assert!(DataYesAdapter::from_config(&config, Some("abc")).is_ok());
    }

    #[test]
    fn from_config_rejects_bad_timeout() {
        let config = FileConfigAdapter::from_string("[api]\ntoken = abc\ntimeout_secs = 0\n").unwrap();
        let err = DataYesAdapter::from_config(&config, None).err().unwrap();
        assert!(matches!(err, SmacrossError::ConfigInvalid { ref key, .. } if key == "timeout_secs"));
    }
}

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::core::price::{
    CompanyProfile, KeyMetrics, MarketDataProvider, PriceTarget, Quote, SymbolMatch,
};
use crate::core::series::{RawDate, RawPricePoint};

const HISTORY_RANGE: &str = "2y";
const QUOTE_RANGE: &str = "1d";
const SEARCH_LIMIT: &str = "10";
const KEY_METRICS_MODULES: &str = "summaryDetail,defaultKeyStatistics,financialData";
const PRICE_TARGET_MODULES: &str = "financialData";

/// Market data from the Yahoo Finance chart, quote summary and search endpoints.
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("tickerlens/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, symbol: &str, range: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/v8/finance/chart/{}", self.base_url, symbol),
            &[("interval", "1d"), ("range", range)],
        )
        .with_context(|| format!("Invalid chart URL for symbol: {symbol}"))
    }

    fn summary_url(&self, symbol: &str, modules: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol),
            &[("modules", modules)],
        )
        .with_context(|| format!("Invalid quote summary URL for symbol: {symbol}"))
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/v1/finance/search", self.base_url),
            &[
                ("q", query),
                ("quotesCount", SEARCH_LIMIT),
                ("newsCount", "0"),
            ],
        )
        .with_context(|| format!("Invalid search URL for query: {query}"))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!("Requesting {} from {}", what, url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for {} URL: {}", e, what, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", what, e))
    }

    async fn fetch_chart(&self, symbol: &str, range: &str) -> Result<ChartItem> {
        let url = self.chart_url(symbol, range)?;
        let data: ChartResponse = self.get_json(url, &format!("symbol: {symbol}")).await?;
        data.chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))
    }

    /// Fetches the requested quote summary modules. A symbol with no summary (funds and
    /// indices often have none) yields an empty item, leaving every field unavailable.
    async fn fetch_summary(&self, symbol: &str, modules: &str) -> Result<SummaryItem> {
        let url = self.summary_url(symbol, modules)?;
        let data: SummaryResponse = self.get_json(url, &format!("summary: {symbol}")).await?;
        let item = data
            .quote_summary
            .result
            .and_then(|items| items.into_iter().next());
        if item.is_none() {
            debug!(symbol, modules, "No quote summary available");
        }
        Ok(item.unwrap_or_default())
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<IndicatorQuote>,
}

#[derive(Deserialize, Debug)]
struct IndicatorQuote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
    #[serde(alias = "chartPreviousClose")]
    previous_close: Option<f64>,
    #[serde(alias = "fiftyTwoWeekHigh")]
    fifty_two_week_high: Option<f64>,
    #[serde(alias = "fiftyTwoWeekLow")]
    fifty_two_week_low: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Deserialize, Debug)]
struct SummaryResult {
    result: Option<Vec<SummaryItem>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SummaryItem {
    #[serde(rename = "summaryDetail")]
    summary_detail: SummaryDetail,
    #[serde(rename = "defaultKeyStatistics")]
    key_statistics: KeyStatistics,
    #[serde(rename = "financialData")]
    financial_data: FinancialData,
}

/// Numeric summary field. Yahoo sends `{}` when a value is unknown.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
struct SummaryValue {
    raw: Option<f64>,
}

fn raw(value: Option<SummaryValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// Yahoo reports returns and margins as fractions.
fn percent(value: Option<SummaryValue>) -> Option<f64> {
    raw(value).map(|v| v * 100.0)
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<SummaryValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<SummaryValue>,
    price_to_sales_trailing12_months: Option<SummaryValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(rename = "forwardPE")]
    forward_pe: Option<SummaryValue>,
    price_to_book: Option<SummaryValue>,
    peg_ratio: Option<SummaryValue>,
    enterprise_to_ebitda: Option<SummaryValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct FinancialData {
    return_on_equity: Option<SummaryValue>,
    return_on_assets: Option<SummaryValue>,
    profit_margins: Option<SummaryValue>,
    operating_margins: Option<SummaryValue>,
    gross_margins: Option<SummaryValue>,
    debt_to_equity: Option<SummaryValue>,
    current_ratio: Option<SummaryValue>,
    quick_ratio: Option<SummaryValue>,
    target_mean_price: Option<SummaryValue>,
    target_high_price: Option<SummaryValue>,
    target_low_price: Option<SummaryValue>,
    number_of_analyst_opinions: Option<SummaryValue>,
    recommendation_key: Option<String>,
}

impl SummaryItem {
    fn key_metrics(&self) -> KeyMetrics {
        let detail = &self.summary_detail;
        let stats = &self.key_statistics;
        let financial = &self.financial_data;
        KeyMetrics {
            trailing_pe: raw(detail.trailing_pe),
            forward_pe: raw(stats.forward_pe).or_else(|| raw(detail.forward_pe)),
            price_to_book: raw(stats.price_to_book),
            price_to_sales: raw(detail.price_to_sales_trailing12_months),
            peg_ratio: raw(stats.peg_ratio),
            ev_to_ebitda: raw(stats.enterprise_to_ebitda),
            return_on_equity: percent(financial.return_on_equity),
            return_on_assets: percent(financial.return_on_assets),
            profit_margin: percent(financial.profit_margins),
            operating_margin: percent(financial.operating_margins),
            gross_margin: percent(financial.gross_margins),
            // Reported as a percentage, e.g. 151.8 for 1.518x.
            debt_to_equity: raw(financial.debt_to_equity).map(|v| v / 100.0),
            current_ratio: raw(financial.current_ratio),
            quick_ratio: raw(financial.quick_ratio),
        }
    }

    fn price_target(self) -> PriceTarget {
        let financial = self.financial_data;
        PriceTarget {
            mean: raw(financial.target_mean_price),
            high: raw(financial.target_high_price),
            low: raw(financial.target_low_price),
            analyst_count: raw(financial.number_of_analyst_opinions)
                .filter(|n| *n >= 0.0)
                .map(|n| n as u32),
            recommendation: financial.recommendation_key.filter(|r| r != "none"),
        }
    }
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Deserialize, Debug)]
struct SearchQuote {
    symbol: String,
    shortname: Option<String>,
    longname: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "exchDisp")]
    exchange_display: Option<String>,
    #[serde(alias = "quoteType")]
    quote_type: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
}

impl SearchQuote {
    fn name(&self) -> Option<String> {
        self.longname.clone().or_else(|| self.shortname.clone())
    }

    fn exchange(&self) -> Option<String> {
        self.exchange_display.clone().or_else(|| self.exchange.clone())
    }
}

/// Pairs timestamps with closes. Missing closes stay `None` for the normalizer to drop.
fn history_points(item: ChartItem) -> Vec<RawPricePoint> {
    let timestamps = item.timestamp.unwrap_or_default();
    let closes = item
        .indicators
        .and_then(|inds| inds.quote.into_iter().next())
        .and_then(|q| q.close)
        .unwrap_or_default();

    timestamps
        .into_iter()
        .enumerate()
        .map(|(i, ts)| {
            RawPricePoint::new(RawDate::Unix(ts), closes.get(i).copied().flatten())
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    /// Looks the symbol up through search. An unknown symbol yields a profile with only
    /// the symbol set rather than an error.
    #[instrument(name = "YahooProfileFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let url = self.search_url(symbol)?;
        let data: SearchResponse = self.get_json(url, &format!("profile: {symbol}")).await?;
        let profile = data
            .quotes
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .map(|q| CompanyProfile {
                symbol: symbol.to_string(),
                name: q.name(),
                exchange: q.exchange(),
                sector: q.sector,
                industry: q.industry,
                quote_type: q.quote_type,
            })
            .unwrap_or_else(|| CompanyProfile {
                symbol: symbol.to_string(),
                ..CompanyProfile::default()
            });
        Ok(profile)
    }

    #[instrument(name = "YahooKeyMetricsFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_key_metrics(&self, symbol: &str) -> Result<KeyMetrics> {
        let item = self.fetch_summary(symbol, KEY_METRICS_MODULES).await?;
        Ok(item.key_metrics())
    }

    #[instrument(name = "YahooPriceTargetFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_price_target(&self, symbol: &str) -> Result<PriceTarget> {
        let item = self.fetch_summary(symbol, PRICE_TARGET_MODULES).await?;
        Ok(item.price_target())
    }

    #[instrument(name = "YahooQuoteFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let item = self.fetch_chart(symbol, QUOTE_RANGE).await?;
        let meta = item.meta;
        Ok(Quote {
            price: meta.regular_market_price,
            currency: meta.currency,
            previous_close: meta.previous_close,
            fifty_two_week_high: meta.fifty_two_week_high,
            fifty_two_week_low: meta.fifty_two_week_low,
        })
    }

    #[instrument(name = "YahooHistoryFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_history(&self, symbol: &str) -> Result<Vec<RawPricePoint>> {
        let item = self.fetch_chart(symbol, HISTORY_RANGE).await?;
        let points = history_points(item);
        debug!(count = points.len(), "Received history");
        Ok(points)
    }

    #[instrument(name = "YahooSearch", skip(self), fields(query = %query))]
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>> {
        let url = self.search_url(query)?;
        let data: SearchResponse = self.get_json(url, &format!("query: {query}")).await?;
        Ok(data
            .quotes
            .into_iter()
            .map(|q| SymbolMatch {
                name: q.name(),
                exchange: q.exchange(),
                symbol: q.symbol,
                quote_type: q.quote_type,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::TimeSeries;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_chart(server: &MockServer, symbol: &str, range: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .and(query_param("range", range))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_search(server: &MockServer, query: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/finance/search"))
            .and(query_param("q", query))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_summary(server: &MockServer, symbol: &str, modules: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v10/finance/quoteSummary/{symbol}")))
            .and(query_param("modules", modules))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    const AAPL_SUMMARY: &str = r#"{
        "quoteSummary": {
            "result": [{
                "summaryDetail": {
                    "trailingPE": {"raw": 29.87, "fmt": "29.87"},
                    "forwardPE": {"raw": 27.5, "fmt": "27.50"},
                    "priceToSalesTrailing12Months": {"raw": 7.61, "fmt": "7.61"}
                },
                "defaultKeyStatistics": {
                    "forwardPE": {"raw": 28.12, "fmt": "28.12"},
                    "priceToBook": {"raw": 45.3, "fmt": "45.30"},
                    "pegRatio": {},
                    "enterpriseToEbitda": {"raw": 22.4, "fmt": "22.40"}
                },
                "financialData": {
                    "returnOnEquity": {"raw": 1.4725, "fmt": "147.25%"},
                    "returnOnAssets": {"raw": 0.2146, "fmt": "21.46%"},
                    "profitMargins": {"raw": 0.2531, "fmt": "25.31%"},
                    "operatingMargins": {"raw": 0.3, "fmt": "30.00%"},
                    "debtToEquity": {"raw": 151.86, "fmt": "151.86%"},
                    "currentRatio": {"raw": 0.87, "fmt": "0.87"},
                    "targetMeanPrice": {"raw": 245.5, "fmt": "245.50"},
                    "targetHighPrice": {"raw": 300.0, "fmt": "300.00"},
                    "targetLowPrice": {"raw": 180.0, "fmt": "180.00"},
                    "numberOfAnalystOpinions": {"raw": 38, "fmt": "38"},
                    "recommendationKey": "buy"
                }
            }],
            "error": null
        }
    }"#;

    #[tokio::test]
    async fn test_fetch_key_metrics() {
        let server = MockServer::start().await;
        mount_summary(&server, "AAPL", KEY_METRICS_MODULES, AAPL_SUMMARY).await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let metrics = provider.fetch_key_metrics("AAPL").await.unwrap();
        let close = |a: Option<f64>, b: f64| a.is_some_and(|a| (a - b).abs() < 1e-9);

        assert_eq!(metrics.trailing_pe, Some(29.87));
        // Key statistics win over the summary detail.
        assert_eq!(metrics.forward_pe, Some(28.12));
        assert_eq!(metrics.price_to_book, Some(45.3));
        assert_eq!(metrics.price_to_sales, Some(7.61));
        assert_eq!(metrics.peg_ratio, None);
        assert!(close(metrics.return_on_equity, 147.25));
        assert!(close(metrics.profit_margin, 25.31));
        assert!(close(metrics.debt_to_equity, 1.5186));
        assert_eq!(metrics.current_ratio, Some(0.87));
        assert_eq!(metrics.quick_ratio, None);
        assert_eq!(metrics.gross_margin, None);
    }

    #[tokio::test]
    async fn test_fetch_price_target() {
        let server = MockServer::start().await;
        mount_summary(&server, "AAPL", PRICE_TARGET_MODULES, AAPL_SUMMARY).await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let target = provider.fetch_price_target("AAPL").await.unwrap();
        assert_eq!(target.mean, Some(245.5));
        assert_eq!(target.high, Some(300.0));
        assert_eq!(target.low, Some(180.0));
        assert_eq!(target.analyst_count, Some(38));
        assert_eq!(target.recommendation.as_deref(), Some("buy"));
    }

    #[tokio::test]
    async fn test_missing_summary_modules_are_none() {
        let server = MockServer::start().await;
        mount_summary(
            &server,
            "SPY",
            KEY_METRICS_MODULES,
            r#"{"quoteSummary": {"result": [{"summaryDetail": {"trailingPE": {}}}]}}"#,
        )
        .await;
        mount_summary(
            &server,
            "SPY",
            PRICE_TARGET_MODULES,
            r#"{"quoteSummary": {"result": null, "error": null}}"#,
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        assert_eq!(
            provider.fetch_key_metrics("SPY").await.unwrap(),
            KeyMetrics::default()
        );
        assert_eq!(
            provider.fetch_price_target("SPY").await.unwrap(),
            PriceTarget::default()
        );
    }

    #[tokio::test]
    async fn test_summary_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/DOWN"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let err = provider.fetch_key_metrics("DOWN").await.unwrap_err();
        assert!(err.to_string().contains("HTTP error: 404"));
    }

    #[tokio::test]
    async fn test_fetch_quote() {
        let server = MockServer::start().await;
        mount_chart(
            &server,
            "AAPL",
            "1d",
            r#"{
                "chart": {
                    "result": [{
                        "meta": {
                            "regularMarketPrice": 150.65,
                            "currency": "USD",
                            "chartPreviousClose": 149.0,
                            "fiftyTwoWeekHigh": 199.62,
                            "fiftyTwoWeekLow": 124.17
                        }
                    }]
                }
            }"#,
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let quote = provider.fetch_quote("AAPL").await.unwrap();
        assert_eq!(quote.price, Some(150.65));
        assert_eq!(quote.currency.as_deref(), Some("USD"));
        assert_eq!(quote.previous_close, Some(149.0));
        assert_eq!(quote.fifty_two_week_high, Some(199.62));
        assert_eq!(quote.fifty_two_week_low, Some(124.17));
    }

    #[tokio::test]
    async fn test_fetch_quote_missing_fields_are_none() {
        let server = MockServer::start().await;
        mount_chart(
            &server,
            "XYZ",
            "1d",
            r#"{"chart": {"result": [{"meta": {}}]}}"#,
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let quote = provider.fetch_quote("XYZ").await.unwrap();
        assert_eq!(quote, Quote::default());
    }

    #[tokio::test]
    async fn test_fetch_history_keeps_null_closes_for_normalizer() {
        let server = MockServer::start().await;
        // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
        mount_chart(
            &server,
            "MSFT",
            "2y",
            r#"{
                "chart": {
                    "result": [{
                        "meta": {"regularMarketPrice": 372.0, "currency": "USD"},
                        "timestamp": [1704205800, 1704292200, 1704378600],
                        "indicators": {"quote": [{"close": [370.87, null, 367.94]}]}
                    }]
                }
            }"#,
        )
        .await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let history = provider.fetch_history("MSFT").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].close, None);

        let series = TimeSeries::normalize("MSFT", history);
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().close, 367.94);
        assert_eq!(
            series.latest().unwrap().date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
    }

    #[tokio::test]
    async fn test_no_price_result_data() {
        let server = MockServer::start().await;
        mount_chart(&server, "INVALID", "2y", r#"{"chart": {"result": []}}"#).await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let err = provider.fetch_history("INVALID").await.unwrap_err();
        assert!(err.to_string().contains("No price data found for symbol: INVALID"));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/DOWN"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let err = provider.fetch_quote("DOWN").await.unwrap_err();
        assert!(err.to_string().contains("HTTP error: 500"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_reported() {
        let server = MockServer::start().await;
        mount_chart(&server, "BAD", "1d", "not json").await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let err = provider.fetch_quote("BAD").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON response"));
    }

    #[tokio::test]
    async fn test_search_and_profile() {
        let server = MockServer::start().await;
        let body = r#"{
            "quotes": [
                {"symbol": "AAPL", "shortname": "Apple Inc.", "longname": "Apple Inc.",
                 "exchange": "NMS", "exchDisp": "NASDAQ", "quoteType": "EQUITY",
                 "sector": "Technology", "industry": "Consumer Electronics"},
                {"symbol": "APLE", "shortname": "Apple Hospitality REIT",
                 "exchange": "NYQ", "quoteType": "EQUITY"}
            ]
        }"#;
        mount_search(&server, "AAPL", body).await;
        mount_search(&server, "apple", body).await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();

        let matches = provider.search("apple").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].symbol, "APLE");
        assert_eq!(matches[1].name.as_deref(), Some("Apple Hospitality REIT"));
        assert_eq!(matches[1].exchange.as_deref(), Some("NYQ"));

        let profile = provider.fetch_profile("AAPL").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.exchange.as_deref(), Some("NASDAQ"));
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
    }

    #[tokio::test]
    async fn test_profile_for_unknown_symbol_is_bare() {
        let server = MockServer::start().await;
        mount_search(&server, "ZZZZ", r#"{"quotes": []}"#).await;

        let provider = YahooFinanceProvider::new(&server.uri()).unwrap();
        let profile = provider.fetch_profile("ZZZZ").await.unwrap();
        assert_eq!(profile.symbol, "ZZZZ");
        assert!(profile.name.is_none());
    }
}

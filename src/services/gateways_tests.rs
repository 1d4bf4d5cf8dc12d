//! Unit tests for the account and market data gateways.

#[cfg(test)]
mod gateways_tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::bus::EventBus;
    use crate::error::{BracketError, VenueError};
    use crate::services::gateways::*;
    use crate::services::test_support::*;

    fn gateways(venue: &Arc<ScriptedVenue>) -> (AccountGateway, MarketDataGateway) {
        let bus = EventBus::new(64);
        let retry = fast_executor(5, &bus);
        (
            AccountGateway::new(venue.clone(), retry.clone()),
            MarketDataGateway::new(venue.clone(), retry),
        )
    }

    // ============= parse_decimal Tests =============

    #[test]
    fn test_parse_decimal_string_and_number() {
        assert_eq!(parse_decimal(&json!("1000.50")), Some(dec!(1000.50)));
        assert_eq!(parse_decimal(&json!(" 12 ")), Some(dec!(12)));
        assert_eq!(parse_decimal(&json!(42)), Some(dec!(42)));
        assert_eq!(parse_decimal(&json!(0.5)), Some(dec!(0.5)));
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
        assert_eq!(parse_decimal(&json!([1])), None);
    }

    // ============= AccountGateway Tests =============

    #[tokio::test]
    async fn test_fetch_account_snapshot() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.set_account(Ok(balance_response("1234.5678")));
        let (account, _) = gateways(&venue);

        let snapshot = account.fetch_account_snapshot().await.unwrap();
        assert_eq!(snapshot.available_margin, dec!(1234.5678));
    }

    #[tokio::test]
    async fn test_fetch_account_retries_empty_response() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.push_account(Err(VenueError::EmptyResponse));
        venue.push_account(Err(transport_error()));
        let (account, _) = gateways(&venue);

        let snapshot = account.fetch_account_snapshot().await.unwrap();
        assert_eq!(snapshot.available_margin, dec!(1000));
        assert_eq!(venue.call_count("get_account_balance"), 3);
    }

    #[tokio::test]
    async fn test_fetch_account_missing_field() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.set_account(Ok(json!({ "data": { "totalEquity": "5" } })));
        let (account, _) = gateways(&venue);

        let err = account.fetch_account_snapshot().await.unwrap_err();
        assert!(matches!(err, BracketError::AccountUnavailable(_)));
        assert_eq!(venue.call_count("get_account_balance"), 1);
    }

    #[tokio::test]
    async fn test_fetch_account_non_decimal_field() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.set_account(Ok(json!({ "data": { "availableBalance": "n/a" } })));
        let (account, _) = gateways(&venue);

        let err = account.fetch_account_snapshot().await.unwrap_err();
        assert!(matches!(err, BracketError::AccountUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_account_exhausts() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.set_account(Err(transport_error()));
        let (account, _) = gateways(&venue);

        let err = account.fetch_account_snapshot().await.unwrap_err();
        assert!(matches!(err, BracketError::ExhaustedRetries { attempts: 5, .. }));
        assert_eq!(venue.call_count("get_account_balance"), 5);
    }

    // ============= Symbol Spec Tests =============

    #[tokio::test]
    async fn test_fetch_symbol_spec_exact_match() {
        let venue = Arc::new(ScriptedVenue::healthy());
        let (_, market) = gateways(&venue);

        let spec = market.fetch_symbol_spec("BTC-USDT").await.unwrap();
        assert_eq!(spec.symbol, "BTC-USDT");
        assert_eq!(spec.tick_size, dec!(0.5));
        assert_eq!(spec.step_size, dec!(0.001));
    }

    #[tokio::test]
    async fn test_fetch_symbol_spec_unknown_not_retried() {
        let venue = Arc::new(ScriptedVenue::healthy());
        let (_, market) = gateways(&venue);

        let err = market.fetch_symbol_spec("btc-usdt").await.unwrap_err();
        assert!(matches!(err, BracketError::UnknownSymbol(ref s) if s == "btc-usdt"));
        assert_eq!(venue.call_count("get_configs"), 1);
    }

    #[tokio::test]
    async fn test_fetch_symbol_spec_retries_transient() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.push_configs(Err(VenueError::Http {
            status: 503,
            body: "maintenance".to_string(),
        }));
        let (_, market) = gateways(&venue);

        let spec = market.fetch_symbol_spec("ETH-USDT").await.unwrap();
        assert_eq!(spec.tick_size, dec!(0.01));
        assert_eq!(venue.call_count("get_configs"), 2);
    }

    #[test]
    fn test_find_symbol_spec_missing_list_is_malformed() {
        let err = find_symbol_spec(&json!({ "data": {} }), "BTC-USDT").unwrap_err();
        assert!(matches!(
            err,
            BracketError::Venue {
                source: VenueError::Malformed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_find_symbol_spec_empty_list_is_unknown() {
        let raw = json!({ "data": { "contractConfig": { "perpetualContract": [] } } });
        assert!(matches!(
            find_symbol_spec(&raw, "BTC-USDT"),
            Err(BracketError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_find_symbol_spec_zero_tick_rejected() {
        let raw = json!({ "data": { "contractConfig": { "perpetualContract": [
            { "symbol": "DOGE-USDT", "tickSize": "0", "stepSize": "1" }
        ] } } });
        assert!(matches!(
            find_symbol_spec(&raw, "DOGE-USDT"),
            Err(BracketError::InvalidGranularity(v)) if v == Decimal::ZERO
        ));
    }

    #[test]
    fn test_find_symbol_spec_missing_step() {
        let raw = json!({ "data": { "contractConfig": { "perpetualContract": [
            { "symbol": "DOGE-USDT", "tickSize": "0.0001" }
        ] } } });
        assert!(matches!(
            find_symbol_spec(&raw, "DOGE-USDT"),
            Err(BracketError::Venue { .. })
        ));
    }

    // ============= Quote Tests =============

    #[tokio::test]
    async fn test_fetch_quote() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.set_ticker(Ok(ticker_response("64123.5")));
        let (_, market) = gateways(&venue);

        let quote = market.fetch_quote("BTC-USDT").await.unwrap();
        assert_eq!(quote.last_price, dec!(64123.5));
    }

    #[tokio::test]
    async fn test_fetch_quote_retries_then_succeeds() {
        let venue = Arc::new(ScriptedVenue::healthy());
        venue.push_ticker(Err(VenueError::EmptyResponse));
        let (_, market) = gateways(&venue);

        let quote = market.fetch_quote("BTC-USDT").await.unwrap();
        assert_eq!(quote.last_price, dec!(50000));
        assert_eq!(venue.call_count("get_ticker"), 2);
    }

    #[test]
    fn test_parse_quote_empty_data() {
        let err = parse_quote(&json!({ "data": [] }), "BTC-USDT").unwrap_err();
        assert!(matches!(err, BracketError::QuoteUnavailable { .. }));

        let err = parse_quote(&json!({ "code": 0 }), "BTC-USDT").unwrap_err();
        assert!(matches!(err, BracketError::QuoteUnavailable { .. }));
    }

    #[test]
    fn test_parse_quote_missing_last_price() {
        let err = parse_quote(&json!({ "data": [{ "markPrice": "1" }] }), "BTC-USDT").unwrap_err();
        assert!(matches!(err, BracketError::QuoteUnavailable { .. }));
    }

    #[test]
    fn test_parse_quote_non_positive() {
        let err = parse_quote(&ticker_response("0"), "BTC-USDT").unwrap_err();
        assert!(matches!(err, BracketError::InvalidPrice(_)));
    }
}

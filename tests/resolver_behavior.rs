//! Behavior-driven tests for ticker resolution
//!
//! These tests verify the order in which identifiers are tried, when the
//! chain stops, and how the per-run cache avoids repeated provider calls.

use std::sync::Arc;

use stockdelta_core::{
    Isin, Resolution, ResolutionCache, StockRequest, SymbolResolver, Ticker,
};
use stockdelta_tests::{providers, FakeMarket, FakeSymbology};

const MSFT_ISIN: &str = "US5949181045";
const APPLE_ISIN: &str = "US0378331005";

fn resolver(market: &Arc<FakeMarket>, symbology: &Arc<FakeSymbology>) -> SymbolResolver {
    SymbolResolver::new(&providers(market, symbology))
}

fn resolved_ticker(resolution: &Resolution) -> &str {
    match resolution {
        Resolution::Resolved(symbol) => symbol.ticker.as_str(),
        Resolution::NotFound => panic!("expected a resolved ticker"),
    }
}

// =============================================================================
// Resolution: Explicit Tickers
// =============================================================================

#[tokio::test]
async fn when_ticker_is_supplied_system_never_consults_symbology() {
    // Given: A request with ticker, ISIN and name
    let market = Arc::new(FakeMarket::new().listing("MSFT", "USD"));
    let symbology = Arc::new(
        FakeSymbology::new()
            .isin(MSFT_ISIN, "WRONG")
            .name("Microsoft", "WRONG"),
    );
    let resolver = resolver(&market, &symbology);

    // When: It is resolved
    let request = StockRequest::new("Microsoft", Some("MSFT"), Some(MSFT_ISIN));
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: The explicit ticker wins and symbology saw no calls
    assert_eq!(resolved_ticker(&resolution), "MSFT");
    assert!(symbology.calls().is_empty());
}

#[tokio::test]
async fn when_explicit_ticker_is_unknown_system_does_not_fall_back() {
    // Given: A ticker the market does not list, and a name symbology could map
    let market = Arc::new(FakeMarket::new().listing("MSFT", "USD"));
    let symbology = Arc::new(FakeSymbology::new().name("Microsoft", "MSFT"));
    let resolver = resolver(&market, &symbology);

    // When: It is resolved
    let request = StockRequest::new("Microsoft", Some("MSFTX"), None);
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: The request is NotFound; the name was never searched
    assert_eq!(resolution, Resolution::NotFound);
    assert!(symbology.calls().is_empty());
}

#[tokio::test]
async fn when_ticker_is_lowercase_system_normalizes_it() {
    // Given: A listing under the upper-case ticker
    let market = Arc::new(FakeMarket::new().listing("VOD.L", "GBp"));
    let symbology = Arc::new(FakeSymbology::new());
    let resolver = resolver(&market, &symbology);

    // When: The request spells it in lower case with padding
    let request = StockRequest::new("Vodafone", Some("  vod.l "), None);
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: The normalized ticker is validated and kept
    let Resolution::Resolved(symbol) = resolution else {
        panic!("expected a resolved ticker");
    };
    assert_eq!(symbol.ticker, Ticker::parse("VOD.L").expect("valid"));
    assert_eq!(symbol.currency, "GBp");
}

// =============================================================================
// Resolution: ISIN and Name Fallback
// =============================================================================

#[tokio::test]
async fn when_isin_maps_to_listed_ticker_system_uses_it_and_skips_name_search() {
    // Given: An ISIN the symbology service maps to a listed ticker
    let market = Arc::new(FakeMarket::new().listing("MSFT", "USD"));
    let symbology = Arc::new(FakeSymbology::new().isin(MSFT_ISIN, "MSFT"));
    let resolver = resolver(&market, &symbology);

    // When: It is resolved without a ticker
    let request = StockRequest::new("Microsoft", None, Some(MSFT_ISIN));
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: The ISIN path is used and the resolved symbol keeps the ISIN
    let Resolution::Resolved(symbol) = &resolution else {
        panic!("expected a resolved ticker");
    };
    assert_eq!(symbol.ticker.as_str(), "MSFT");
    assert_eq!(symbol.isin, Isin::parse(MSFT_ISIN).ok());
    assert_eq!(symbology.calls(), vec![format!("isin:{MSFT_ISIN}")]);
}

#[tokio::test]
async fn when_isin_candidate_is_unlisted_system_falls_back_to_name() {
    // Given: The ISIN maps to a ticker with no market data, the name to a good one
    let market = Arc::new(FakeMarket::new().listing("MSFT", "USD"));
    let symbology = Arc::new(
        FakeSymbology::new()
            .isin(MSFT_ISIN, "MSF.DE")
            .name("Microsoft", "MSFT"),
    );
    let resolver = resolver(&market, &symbology);

    // When: It is resolved
    let request = StockRequest::new("Microsoft", None, Some(MSFT_ISIN));
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: Both steps ran in order and the name result won
    assert_eq!(resolved_ticker(&resolution), "MSFT");
    assert_eq!(
        symbology.calls(),
        vec![format!("isin:{MSFT_ISIN}"), String::from("name:Microsoft")]
    );
    assert_eq!(
        market.calls(),
        vec![String::from("currency:MSF.DE"), String::from("currency:MSFT")]
    );
}

#[tokio::test]
async fn when_preferred_search_hit_is_unlisted_system_confirms_the_next_one() {
    // Given: Name search ranks a London line Yahoo does not list above a US line it does
    let market = Arc::new(FakeMarket::new().listing("VOD", "USD"));
    let symbology = Arc::new(
        FakeSymbology::new()
            .name("Vodafone", "VOD.L")
            .name("Vodafone", "VOD"),
    );
    let resolver = resolver(&market, &symbology);

    // When: The name alone is resolved
    let resolution = resolver
        .resolve(&StockRequest::named("Vodafone"))
        .await
        .expect("resolve");

    // Then: Both hits were confirmed in rank order from a single search
    assert_eq!(resolved_ticker(&resolution), "VOD");
    assert_eq!(symbology.calls(), vec![String::from("name:Vodafone")]);
    assert_eq!(
        market.calls(),
        vec![String::from("currency:VOD.L"), String::from("currency:VOD")]
    );
}

#[tokio::test]
async fn when_no_search_hit_is_listed_system_reports_not_found() {
    // Given: Two search hits, neither known to the market
    let market = Arc::new(FakeMarket::new());
    let symbology = Arc::new(
        FakeSymbology::new()
            .name("Vodafone", "VOD.L")
            .name("Vodafone", "VOD"),
    );
    let resolver = resolver(&market, &symbology);

    // When: The name is resolved
    let resolution = resolver
        .resolve(&StockRequest::named("Vodafone"))
        .await
        .expect("resolve");

    // Then: Every hit was tried before giving up
    assert_eq!(resolution, Resolution::NotFound);
    assert_eq!(market.calls().len(), 2);
}

#[tokio::test]
async fn when_isin_is_malformed_system_ignores_it_and_searches_by_name() {
    // Given: A request with a bad check digit in its ISIN
    let market = Arc::new(FakeMarket::new().listing("MSFT", "USD"));
    let symbology = Arc::new(FakeSymbology::new().name("Microsoft", "MSFT"));
    let resolver = resolver(&market, &symbology);

    // When: It is resolved
    let request = StockRequest::new("Microsoft", None, Some("US5949181040"));
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: The ISIN never reached symbology
    assert_eq!(resolved_ticker(&resolution), "MSFT");
    assert_eq!(symbology.calls(), vec![String::from("name:Microsoft")]);
}

#[tokio::test]
async fn when_every_step_misses_system_reports_not_found() {
    // Given: Providers that know nothing
    let market = Arc::new(FakeMarket::new());
    let symbology = Arc::new(FakeSymbology::new());
    let resolver = resolver(&market, &symbology);

    // When: A made-up company is resolved
    let request = StockRequest::named("Totally Fake Corp Ltd");
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: NotFound, without any market-data validation
    assert_eq!(resolution, Resolution::NotFound);
    assert!(market.calls().is_empty());
}

#[tokio::test]
async fn when_request_is_blank_system_makes_no_provider_calls() {
    // Given: A request with no usable identifier
    let market = Arc::new(FakeMarket::new());
    let symbology = Arc::new(FakeSymbology::new());
    let resolver = resolver(&market, &symbology);

    // When: It is resolved
    let request = StockRequest::new("  ", Some(" "), Some(""));
    let resolution = resolver.resolve(&request).await.expect("resolve");

    // Then: NotFound straight away
    assert_eq!(resolution, Resolution::NotFound);
    assert!(symbology.calls().is_empty());
    assert!(market.calls().is_empty());
}

// =============================================================================
// Resolution: Caching
// =============================================================================

#[tokio::test]
async fn when_same_name_is_resolved_twice_system_reuses_the_first_answer() {
    // Given: A name-only request
    let market = Arc::new(FakeMarket::new().listing("VOD.L", "GBp"));
    let symbology = Arc::new(FakeSymbology::new().name("Vodafone", "VOD.L"));
    let resolver = resolver(&market, &symbology);
    let request = StockRequest::named("Vodafone");

    // When: It is resolved twice
    let first = resolver.resolve(&request).await.expect("first");
    let second = resolver.resolve(&request).await.expect("second");

    // Then: The second answer came from the cache
    assert_eq!(first, second);
    assert_eq!(symbology.calls().len(), 1);
    assert_eq!(market.calls().len(), 1);
    assert_eq!(resolver.cache().len().await, 1);
}

#[tokio::test]
async fn when_not_found_is_cached_system_does_not_search_again() {
    // Given: A name nothing knows
    let market = Arc::new(FakeMarket::new());
    let symbology = Arc::new(FakeSymbology::new());
    let resolver = resolver(&market, &symbology);
    let request = StockRequest::named("Nobody Plc");

    // When: It is resolved twice
    resolver.resolve(&request).await.expect("first");
    resolver.resolve(&request).await.expect("second");

    // Then: The name was searched once
    assert_eq!(symbology.calls(), vec![String::from("name:Nobody Plc")]);
}

#[tokio::test]
async fn when_cache_is_disabled_system_calls_providers_every_time() {
    // Given: A resolver with caching switched off
    let market = Arc::new(FakeMarket::new().listing("VOD.L", "GBp"));
    let symbology = Arc::new(FakeSymbology::new().name("Vodafone", "VOD.L"));
    let resolver = resolver(&market, &symbology).with_cache(ResolutionCache::disabled());
    let request = StockRequest::named("Vodafone");

    // When: It is resolved twice
    resolver.resolve(&request).await.expect("first");
    resolver.resolve(&request).await.expect("second");

    // Then: Symbology was asked both times
    assert_eq!(symbology.calls().len(), 2);
}

// =============================================================================
// Resolution: ISIN Prefetch
// =============================================================================

#[tokio::test]
async fn when_isins_are_prefetched_system_maps_them_in_one_call() {
    // Given: A batching symbology service and a mix of requests
    let market = Arc::new(
        FakeMarket::new()
            .listing("MSFT", "USD")
            .listing("AAPL", "USD")
            .listing("TSCO.L", "GBp"),
    );
    let symbology = Arc::new(
        FakeSymbology::new()
            .batching()
            .isin(MSFT_ISIN, "MSFT")
            .isin(APPLE_ISIN, "AAPL"),
    );
    let resolver = resolver(&market, &symbology);
    let requests = vec![
        StockRequest::new("Microsoft", None, Some(MSFT_ISIN)),
        StockRequest::new("Tesco", Some("TSCO.L"), Some("GB0008847096")),
        StockRequest::new("Apple", None, Some(APPLE_ISIN)),
        StockRequest::new("Microsoft again", None, Some(MSFT_ISIN)),
        StockRequest::new("Broken", None, Some("US5949181040")),
    ];

    // When: The batch is prefetched and then resolved
    resolver.prefetch_isins(&requests).await.expect("prefetch");
    for request in &requests[..3] {
        resolver.resolve(request).await.expect("resolve");
    }

    // Then: One call mapped each distinct valid ISIN that needed mapping
    assert_eq!(
        symbology.calls(),
        vec![format!("isins:{MSFT_ISIN},{APPLE_ISIN}")]
    );
    assert_eq!(
        market.calls(),
        vec![
            String::from("currency:MSFT"),
            String::from("currency:TSCO.L"),
            String::from("currency:AAPL"),
        ]
    );
}

#[tokio::test]
async fn when_prefetched_isin_is_unknown_system_goes_straight_to_name_search() {
    // Given: A batching service that cannot map the ISIN but finds the name
    let market = Arc::new(FakeMarket::new().listing("MSFT", "USD"));
    let symbology = Arc::new(FakeSymbology::new().batching().name("Microsoft", "MSFT"));
    let resolver = resolver(&market, &symbology);
    let requests = vec![StockRequest::new("Microsoft", None, Some(MSFT_ISIN))];

    // When: It is prefetched and resolved
    resolver.prefetch_isins(&requests).await.expect("prefetch");
    let resolution = resolver.resolve(&requests[0]).await.expect("resolve");

    // Then: The remembered miss skipped a second mapping call
    assert_eq!(resolved_ticker(&resolution), "MSFT");
    assert_eq!(
        symbology.calls(),
        vec![format!("isins:{MSFT_ISIN}"), String::from("name:Microsoft")]
    );
}

#[tokio::test]
async fn when_nothing_needs_mapping_system_skips_the_prefetch_call() {
    // Given: Requests with explicit tickers or no ISIN
    let market = Arc::new(FakeMarket::new());
    let symbology = Arc::new(FakeSymbology::new().batching());
    let resolver = resolver(&market, &symbology);
    let requests = vec![
        StockRequest::new("Microsoft", Some("MSFT"), Some(MSFT_ISIN)),
        StockRequest::named("Vodafone"),
    ];

    // When: The batch is prefetched
    resolver.prefetch_isins(&requests).await.expect("prefetch");

    // Then: Symbology was not called
    assert!(symbology.calls().is_empty());
}

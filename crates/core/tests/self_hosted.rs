//! Wire tests for the self-hosted backends (Torznab family, Zilean, Stremio addons).

use indexhub_core::indexer::stremio::StremioClient;
use indexhub_core::indexer::torznab::TorznabClient;
use indexhub_core::indexer::zilean::ZileanClient;
use indexhub_core::indexer::{build_client, ApiKeyTransport, ClientSettings, HttpSettings};
use indexhub_core::{IndexerClient, IndexerConfig, IndexerError, IndexerType, MediaType, SearchRequest};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HASH_A: &str = "0123456789abcdef0123456789abcdef01234567";
const HASH_B: &str = "89abcdef0123456789abcdef0123456789abcdef";

const TORZNAB_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:torznab="http://torznab.com/schemas/2015/feed">
  <channel>
    <title>Jackett</title>
    <item>
      <title><![CDATA[Breaking.Bad.S02E05.1080p.BluRay.x264 & Extras]]></title>
      <guid>https://jackett.local/dl/1</guid>
      <size>1503238553</size>
      <torznab:attr name="infohash" value="0123456789ABCDEF0123456789ABCDEF01234567"/>
      <torznab:attr name="seeders" value="42"/>
      <torznab:attr name="peers" value="50"/>
    </item>
    <item>
      <title>Breaking.Bad.S02E05.720p.HDTV &amp; More</title>
      <link>magnet:?xt=urn:btih:89abcdef0123456789abcdef0123456789abcdef&amp;dn=bb</link>
      <torznab:attr name="size" value="734003200"/>
      <torznab:attr name="seeders" value="7"/>
    </item>
    <item>
      <title>No hash anywhere</title>
      <link>https://jackett.local/dl/3</link>
    </item>
  </channel>
</rss>"#;

mod torznab_tests {
    use super::*;

    fn jackett(base: &str) -> IndexerConfig {
        IndexerConfig::new("jackett", "Jackett", IndexerType::Jackett)
            .with_base_url(base)
            .with_api_key("secret")
    }

    #[tokio::test]
    async fn test_jackett_xml_with_query_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2.0/indexers/all/results/torznab/api"))
            .and(query_param("t", "search"))
            .and(query_param("imdbid", "tt0903747"))
            .and(query_param("season", "2"))
            .and(query_param("ep", "5"))
            .and(query_param("apikey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TORZNAB_FEED))
            .mount(&server)
            .await;

        let client = TorznabClient::new(&jackett(&server.uri()), &HttpSettings::default()).unwrap();
        let results = client
            .search(&SearchRequest::episode("tt0903747", 2, 5))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].info_hash, HASH_A);
        assert_eq!(results[0].title, "Breaking.Bad.S02E05.1080p.BluRay.x264 & Extras");
        assert_eq!(results[0].seeders, 42);
        assert_eq!(results[0].leechers, 8);
        assert_eq!(results[0].size_bytes, 1_503_238_553);
        assert_eq!(results[1].info_hash, HASH_B);
        assert_eq!(results[1].title, "Breaking.Bad.S02E05.720p.HDTV & More");
        assert_eq!(results[1].size_bytes, 734_003_200);
        assert!(results[1].magnet_uri.as_deref().unwrap().contains("dn=bb"));
    }

    #[tokio::test]
    async fn test_free_text_and_category() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("t", "search"))
            .and(query_param("q", "the matrix"))
            .and(query_param("cat", "2000"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<rss><channel></channel></rss>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = IndexerConfig::new("tz", "Torznab", IndexerType::Torznab)
            .with_base_url(server.uri())
            .with_category_filter("2000");
        let client = TorznabClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client
            .search_by_query("the matrix", MediaType::Movie)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_error_element_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0" encoding="UTF-8"?><error code="100" description="Invalid API Key"/>"#,
            ))
            .mount(&server)
            .await;

        let client = TorznabClient::new(&jackett(&server.uri()), &HttpSettings::default()).unwrap();
        let err = client
            .search(&SearchRequest::movie("tt0111161"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            IndexerError::Network("Torznab error 100: Invalid API Key".into())
        );
    }

    #[tokio::test]
    async fn test_prowlarr_json_with_header_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("type", "moviesearch"))
            .and(query_param("query", "{ImdbId:tt0111161}"))
            .and(header("X-Api-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "title": "The.Shawshank.Redemption.1994.2160p.UHD.BluRay.HDR10",
                    "size": 60129542144u64,
                    "seeders": 15,
                    "leechers": 1,
                    "infoHash": HASH_A
                },
                {
                    "title": "The.Shawshank.Redemption.1994.1080p",
                    "size": "8589934592",
                    "seeders": "33",
                    "magnetUrl": format!("magnet:?xt=urn:btih:{}", HASH_B)
                }
            ])))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("prowlarr", "Prowlarr", IndexerType::Prowlarr)
            .with_base_url(server.uri())
            .with_api_key("secret");
        assert_eq!(config.api_key_transport, ApiKeyTransport::Header);

        let client = TorznabClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client
            .search(&SearchRequest::movie("tt0111161"))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].quality.to_string(), "4k");
        assert_eq!(results[0].hdr_format.to_string(), "hdr10");
        assert_eq!(results[1].info_hash, HASH_B);
        assert_eq!(results[1].seeders, 33);
    }

    #[tokio::test]
    async fn test_jackett_results_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Results": [
                    { "Title": "Movie.2020.720p", "Size": 1000, "Seeders": 3, "Peers": 5, "InfoHash": HASH_A }
                ]
            })))
            .mount(&server)
            .await;

        let client = TorznabClient::new(&jackett(&server.uri()), &HttpSettings::default()).unwrap();
        let results = client
            .search(&SearchRequest::movie("tt1"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].leechers, 2);
    }

    #[tokio::test]
    async fn test_malformed_json_item_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "title": "Movie.2020.1080p", "seeders": 9, "infoHash": HASH_A },
                { "title": 42, "infoHash": HASH_B }
            ])))
            .mount(&server)
            .await;

        let client = TorznabClient::new(&jackett(&server.uri()), &HttpSettings::default()).unwrap();
        let results = client
            .search(&SearchRequest::movie("tt1"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].info_hash, HASH_A);
    }

    #[tokio::test]
    async fn test_health_check_uses_caps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2.0/indexers/all/results/torznab/api"))
            .and(query_param("t", "caps"))
            .and(query_param("apikey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<caps/>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = TorznabClient::new(&jackett(&server.uri()), &HttpSettings::default()).unwrap();
        client.health_check().await.unwrap();
    }

    #[test]
    fn test_missing_base_url_is_invalid_configuration() {
        let config = IndexerConfig::new("jackett", "Jackett", IndexerType::Jackett);
        let err = build_client(&config, &ClientSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, IndexerError::InvalidConfiguration(_)));
    }
}

mod zilean_tests {
    use super::*;

    #[tokio::test]
    async fn test_filtered_search_by_episode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dmm/filtered"))
            .and(query_param("imdbId", "tt0903747"))
            .and(query_param("season", "2"))
            .and(query_param("episode", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "infoHash": HASH_A, "rawTitle": "Breaking.Bad.S02E05.1080p.WEB-DL", "size": "1503238553" },
                { "infoHash": "not-a-hash", "rawTitle": "Broken" }
            ])))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("zilean", "Zilean", IndexerType::Zilean)
            .with_base_url(server.uri());
        let client = ZileanClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client
            .search(&SearchRequest::episode("tt0903747", 2, 5))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].seeders, 0);
        assert_eq!(results[0].size_bytes, 1_503_238_553);
    }

    #[tokio::test]
    async fn test_malformed_row_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dmm/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "infoHash": HASH_A, "rawTitle": "Movie.2020.1080p" },
                { "infoHash": HASH_B, "rawTitle": { "nested": true } }
            ])))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("zilean", "Zilean", IndexerType::Zilean)
            .with_base_url(server.uri());
        let client = ZileanClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client
            .search_by_query("movie", MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].info_hash, HASH_A);
    }

    #[tokio::test]
    async fn test_text_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dmm/search"))
            .and(query_param("query", "breaking bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "infoHash": HASH_B, "filename": "Breaking.Bad.S01.Complete.720p" }
            ])))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("zilean", "Zilean", IndexerType::Zilean)
            .with_base_url(server.uri());
        let client = ZileanClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client
            .search_by_query("breaking bad", MediaType::Series)
            .await
            .unwrap();
        assert_eq!(results[0].title, "Breaking.Bad.S01.Complete.720p");
    }
}

mod stremio_tests {
    use super::*;

    #[tokio::test]
    async fn test_torrentio_style_streams() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream/series/tt0903747:2:5.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "streams": [
                    {
                        "name": "Torrentio\n1080p",
                        "title": "Breaking.Bad.S02E05.1080p.BluRay.x265\n👤 87 💾 1.5 GB ⚙️ ThePirateBay",
                        "infoHash": HASH_A
                    },
                    {
                        "name": "Torrentio\n720p",
                        "title": "Breaking.Bad.S02E05.720p.HDTV",
                        "url": format!("magnet:?xt=urn:btih:{}", HASH_B),
                        "behaviorHints": { "videoSize": 734003200u64, "seeders": 12 }
                    },
                    {
                        "name": "Direct",
                        "title": "Breaking.Bad.S02E05.WEB",
                        "url": "https://cdn.example/bb-s02e05.mkv"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("addon", "Addon", IndexerType::Stremio)
            .with_base_url(format!("{}/manifest.json", server.uri()));
        let client = StremioClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client
            .search(&SearchRequest::episode("tt0903747", 2, 5))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Breaking.Bad.S02E05.1080p.BluRay.x265");
        assert_eq!(results[0].seeders, 87);
        assert_eq!(results[0].size_bytes, 1_610_612_736);
        assert_eq!(results[1].info_hash, HASH_B);
        assert_eq!(results[1].seeders, 12);
        assert_eq!(results[1].size_bytes, 734_003_200);
        assert_eq!(results[2].info_hash.len(), 40);
    }

    #[tokio::test]
    async fn test_malformed_stream_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream/movie/tt0111161.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "streams": [
                    { "title": ["broken"], "infoHash": HASH_B },
                    { "title": "Movie.1080p", "infoHash": "", "url": "https://cdn.example/movie.mkv" }
                ]
            })))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("addon", "Addon", IndexerType::Stremio)
            .with_base_url(server.uri());
        let client = StremioClient::new(&config, &HttpSettings::default()).unwrap();
        let results = client.search(&SearchRequest::movie("tt0111161")).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Movie.1080p");
        assert_eq!(results[0].info_hash.len(), 40);
    }

    #[tokio::test]
    async fn test_synthesized_hash_is_stable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream/movie/tt0111161.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "streams": [{ "title": "Movie.1080p", "url": "https://cdn.example/movie.mkv" }]
            })))
            .mount(&server)
            .await;

        let config = IndexerConfig::new("addon", "Addon", IndexerType::Stremio)
            .with_base_url(server.uri());
        let client = StremioClient::new(&config, &HttpSettings::default()).unwrap();

        let first = client.search(&SearchRequest::movie("tt0111161")).await.unwrap();
        let second = client
            .search_by_query("tt0111161", MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(first[0].info_hash, second[0].info_hash);
    }

    #[tokio::test]
    async fn test_health_check_fetches_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "addon" })))
            .expect(1)
            .mount(&server)
            .await;

        let config = IndexerConfig::new("addon", "Addon", IndexerType::Stremio)
            .with_base_url(server.uri());
        let client = StremioClient::new(&config, &HttpSettings::default()).unwrap();
        client.health_check().await.unwrap();
    }
}

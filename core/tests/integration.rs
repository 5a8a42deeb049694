//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `ShlinkClient` over
//! real HTTP through the default ureq executor. Validates request building,
//! pagination and error translation against an actual server.

use mock_server::MockConfig;
use shlink_core::{
    ShlinkClient, ShlinkConfig, ShlinkError, ShortUrlCreation, ShortUrlEdition, ShortUrlIdentifier, ShortUrlsFilter,
    TagRenaming,
};

const API_KEY: &str = "mock-api-key";

/// Run the mock server on its own runtime thread and return its origin.
fn spawn_server(config: MockConfig) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_config(listener, config).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client_for(origin: &str, api_key: &str) -> ShlinkClient<shlink_core::HttpClient<shlink_core::UreqExecutor>> {
    ShlinkClient::from_config(ShlinkConfig::new(origin, api_key).unwrap())
}

/// Hit the public redirect `times` times to record visits. The redirect is
/// followed, so the long URL should point back at the mock.
fn visit(origin: &str, short_code: &str, times: usize) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    for _ in 0..times {
        agent.get(&format!("{origin}/{short_code}")).call().unwrap();
    }
}

#[test]
fn short_url_lifecycle() {
    let origin = spawn_server(MockConfig::default());
    let client = client_for(&origin, API_KEY);
    let short_urls = client.short_urls();

    // Step 1: list, should be empty.
    let list = short_urls.list_short_urls();
    assert!(list.collect_all().unwrap().is_empty());
    assert_eq!(list.count().unwrap(), 0);

    // Step 2: create with a custom slug.
    let created = short_urls
        .create_short_url(
            &ShortUrlCreation::for_long_url("https://shlink.io")
                .with_custom_slug("shlink")
                .with_tags(["docs", "home"])
                .with_title("Shlink"),
        )
        .unwrap();
    assert_eq!(created.short_code, "shlink");
    assert_eq!(created.long_url, "https://shlink.io");
    assert_eq!(created.tags, vec!["docs", "home"]);
    assert_eq!(created.title.as_deref(), Some("Shlink"));
    assert!(created.forward_query);
    assert!(created.date_created.is_some());

    // Step 3: get it back.
    let identifier = ShortUrlIdentifier::from_short_code("shlink");
    let fetched = short_urls.get_short_url(&identifier).unwrap();
    assert_eq!(fetched, created);

    // Step 4: edit.
    let edited = short_urls
        .edit_short_url(
            &identifier,
            &ShortUrlEdition::create()
                .with_long_url("https://shlink.io/documentation")
                .with_max_visits(100),
        )
        .unwrap();
    assert_eq!(edited.long_url, "https://shlink.io/documentation");
    assert_eq!(edited.meta.max_visits, Some(100));
    assert_eq!(edited.title.as_deref(), Some("Shlink"));

    // Step 5: delete, then it is gone.
    short_urls.delete_short_url(&identifier).unwrap();
    let err = short_urls.get_short_url(&identifier).unwrap_err();
    assert!(matches!(err, ShlinkError::ShortUrlNotFound(_)), "{err:?}");
    assert_eq!(err.status(), Some(404));

    // Step 6: deleting again is also not found.
    let err = short_urls.delete_short_url(&identifier).unwrap_err();
    assert!(matches!(err, ShlinkError::ShortUrlNotFound(_)), "{err:?}");
}

#[test]
fn list_walks_every_page() {
    let origin = spawn_server(MockConfig::default());
    let client = client_for(&origin, API_KEY);
    let short_urls = client.short_urls();

    for i in 0..7 {
        short_urls
            .create_short_url(&ShortUrlCreation::for_long_url(&format!("https://example.com/{i}")).with_tags(["t"]))
            .unwrap();
    }

    let list = short_urls.list_short_urls().with_items_per_page(3);
    let all = list.collect_all().unwrap();
    assert_eq!(all.len(), 7);
    let urls: Vec<&str> = all.iter().map(|s| s.long_url.as_str()).collect();
    assert_eq!(urls[0], "https://example.com/0");
    assert_eq!(urls[6], "https://example.com/6");
    assert_eq!(list.count().unwrap(), 7);

    // A second traversal sees the same items.
    assert_eq!(list.iter().count(), 7);

    // Non-paginating filters stop after the first page.
    let first_page = short_urls
        .list_short_urls_with_filter(&ShortUrlsFilter::create().without_pagination())
        .with_items_per_page(3)
        .collect_all()
        .unwrap();
    assert_eq!(first_page.len(), 3);

    let filtered = short_urls
        .list_short_urls_with_filter(&ShortUrlsFilter::create().search_term("example.com/4"))
        .collect_all()
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[test]
fn creation_failures_are_typed() {
    let origin = spawn_server(MockConfig::default());
    let client = client_for(&origin, API_KEY);
    let short_urls = client.short_urls();

    let err = short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("not-a-url"))
        .unwrap_err();
    assert!(matches!(err, ShlinkError::InvalidLongUrl { .. }), "{err:?}");
    assert_eq!(err.long_url(), Some("not-a-url"));

    short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("https://a.com").with_custom_slug("taken"))
        .unwrap();
    let err = short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("https://b.com").with_custom_slug("taken"))
        .unwrap_err();
    assert!(matches!(err, ShlinkError::NonUniqueSlug(_)), "{err:?}");

    let err = short_urls
        .edit_short_url(
            &ShortUrlIdentifier::from_short_code("taken"),
            &ShortUrlEdition::create().with_long_url("nope"),
        )
        .unwrap_err();
    assert!(matches!(err, ShlinkError::InvalidData(_)), "{err:?}");
}

#[test]
fn find_if_exists_returns_existing() {
    let origin = spawn_server(MockConfig::default());
    let client = client_for(&origin, API_KEY);
    let short_urls = client.short_urls();

    let first = short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("https://a.com"))
        .unwrap();
    let second = short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("https://a.com").returning_existing_matching())
        .unwrap();
    assert_eq!(first.short_code, second.short_code);
}

#[test]
fn delete_threshold_is_reported() {
    let origin = spawn_server(MockConfig {
        delete_threshold: 2,
        ..MockConfig::default()
    });
    let client = client_for(&origin, API_KEY);
    let short_urls = client.short_urls();

    short_urls
        .create_short_url(&ShortUrlCreation::for_long_url(&format!("{origin}/landing")).with_custom_slug("popular"))
        .unwrap();
    visit(&origin, "popular", 3);

    let identifier = ShortUrlIdentifier::from_short_code("popular");
    assert_eq!(short_urls.get_short_url(&identifier).unwrap().visits.total, 3);

    let err = short_urls.delete_short_url(&identifier).unwrap_err();
    match err {
        ShlinkError::DeleteShortUrlThreshold { threshold, source } => {
            assert_eq!(threshold, Some(2));
            assert_eq!(source.status(), 422);
        }
        other => panic!("expected DeleteShortUrlThreshold, got {other:?}"),
    }
}

#[test]
fn tag_operations() {
    let origin = spawn_server(MockConfig::default());
    let client = client_for(&origin, API_KEY);
    let (short_urls, tags) = (client.short_urls(), client.tags());

    short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("https://a.com").with_tags(["foo", "bar"]))
        .unwrap();
    short_urls
        .create_short_url(&ShortUrlCreation::for_long_url("https://b.com").with_tags(["foo"]))
        .unwrap();

    assert_eq!(tags.list_tags().unwrap(), vec!["bar", "foo"]);

    let stats = tags.list_tags_with_stats().with_items_per_page(1).collect_all().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[1].tag, "foo");
    assert_eq!(stats[1].short_urls_count, 2);

    #[allow(deprecated)]
    let legacy = tags.list_tags_and_stats().unwrap();
    assert_eq!(legacy, stats);

    let err = tags.rename_tag(&TagRenaming::from_old_to_new("missing", "x")).unwrap_err();
    assert!(matches!(err, ShlinkError::TagNotFound(_)), "{err:?}");

    let err = tags.rename_tag(&TagRenaming::from_old_to_new("foo", "bar")).unwrap_err();
    assert!(matches!(err, ShlinkError::TagConflict(_)), "{err:?}");

    tags.rename_tag(&TagRenaming::from_old_to_new("foo", "baz")).unwrap();
    assert_eq!(tags.list_tags().unwrap(), vec!["bar", "baz"]);

    tags.delete_tags(&["bar"]).unwrap();
    assert_eq!(tags.list_tags().unwrap(), vec!["baz"]);
}

#[test]
fn read_only_key_cannot_modify_tags() {
    let origin = spawn_server(MockConfig {
        read_only_api_key: Some("read-only".to_string()),
        ..MockConfig::default()
    });
    client_for(&origin, API_KEY)
        .short_urls()
        .create_short_url(&ShortUrlCreation::for_long_url("https://a.com").with_tags(["foo"]))
        .unwrap();

    let client = client_for(&origin, "read-only");
    let tags = client.tags();
    assert_eq!(tags.list_tags().unwrap(), vec!["foo"]);

    let err = tags.rename_tag(&TagRenaming::from_old_to_new("foo", "bar")).unwrap_err();
    assert!(matches!(err, ShlinkError::ForbiddenTagOperation(_)), "{err:?}");

    let err = tags.delete_tags(&["foo"]).unwrap_err();
    assert!(matches!(err, ShlinkError::ForbiddenTagOperation(_)), "{err:?}");
}

#[test]
fn unknown_api_key_surfaces_untranslated() {
    let origin = spawn_server(MockConfig::default());
    let client = client_for(&origin, "wrong");

    let err = client
        .short_urls()
        .get_short_url(&ShortUrlIdentifier::from_short_code("abc"))
        .unwrap_err();
    match err {
        ShlinkError::Http(failure) => {
            assert_eq!(failure.status(), 401);
            assert_eq!(failure.error_type(), "INVALID_API_KEY");
        }
        other => panic!("expected Http, got {other:?}"),
    }

    let err = client.short_urls().list_short_urls().collect_all().unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"), API_KEY);
    let err = client.tags().list_tags().unwrap_err();
    assert!(matches!(err, ShlinkError::Transport(_)), "{err:?}");
}

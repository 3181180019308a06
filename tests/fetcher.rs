use std::collections::HashMap;
use std::thread;

use clonernews::data::ItemSource;
use clonernews::feed::{Applied, FeedSession};
use clonernews::hackernews::{Category, Client, ClientConfig, FetchError, ItemKind};
use tiny_http::{Response, Server};

/// Serves canned JSON bodies by path until the test process exits.
fn fake_api(routes: Vec<(&str, u16, String)>) -> String {
    let routes: HashMap<String, (u16, String)> = routes
        .into_iter()
        .map(|(path, status, body)| (path.to_string(), (status, body)))
        .collect();
    let server = Server::http("127.0.0.1:0").expect("bind fake api");
    let addr = server.server_addr().to_string();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let path = request.url().split('?').next().unwrap_or("").to_string();
            let response = match routes.get(&path) {
                Some((status, body)) => {
                    Response::from_string(body.clone()).with_status_code(*status)
                }
                None => Response::from_string("null").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}")
}

fn client_for(base: &str) -> Client {
    Client::new(ClientConfig {
        base_url: format!("{base}/v0"),
        search_url: format!("{base}/search"),
        ..ClientConfig::default()
    })
    .expect("client")
}

fn story_json(id: i64) -> String {
    format!(
        r#"{{"id":{id},"type":"story","by":"user{id}","time":1700000000,"score":{id},"title":"Story {id}"}}"#
    )
}

#[test]
fn fetches_and_decodes_item() {
    let base = fake_api(vec![("/v0/item/8863.json", 200, story_json(8863))]);
    let client = client_for(&base);
    let item = client.item(8863).unwrap();
    assert_eq!(item.id, 8863);
    assert_eq!(item.kind, ItemKind::Story);
    assert_eq!(item.title.as_deref(), Some("Story 8863"));
}

#[test]
fn null_item_is_missing() {
    let base = fake_api(vec![("/v0/item/1.json", 200, "null".to_string())]);
    let client = client_for(&base);
    assert!(matches!(client.item(1), Err(FetchError::Missing { id: 1 })));
}

#[test]
fn non_success_status_is_reported() {
    let base = fake_api(vec![("/v0/item/2.json", 503, "{}".to_string())]);
    let client = client_for(&base);
    match client.item(2) {
        Err(FetchError::Status { status, url }) => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.ends_with("/v0/item/2.json"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn top_stories_first_page_in_list_order() {
    let ids: Vec<i64> = (200..215).rev().collect();
    let mut routes = vec![(
        "/v0/topstories.json",
        200,
        serde_json::to_string(&ids).unwrap(),
    )];
    let paths: Vec<String> = ids.iter().map(|id| format!("/v0/item/{id}.json")).collect();
    for (path, id) in paths.iter().zip(&ids) {
        routes.push((path.as_str(), 200, story_json(*id)));
    }
    let base = fake_api(routes);
    let client = client_for(&base);

    let mut session = FeedSession::new(Category::Top, 7);
    let request = session.begin_page();
    let items = client
        .page(request.category, request.start, request.len)
        .unwrap();
    let Applied::Rendered(rendered) = session.apply_page(request, items) else {
        panic!("page should apply");
    };
    assert_eq!(
        rendered.iter().map(|item| item.id).collect::<Vec<_>>(),
        ids[..7].to_vec()
    );
    assert_eq!(session.offset(), 7);
}

#[test]
fn one_missing_item_fails_the_page() {
    let base = fake_api(vec![
        ("/v0/newstories.json", 200, "[1,2]".to_string()),
        ("/v0/item/1.json", 200, story_json(1)),
    ]);
    let client = client_for(&base);
    assert!(client.page(Category::New, 0, 7).is_err());
}

#[test]
fn polls_come_from_search() {
    let body = r#"{"hits":[{"objectID":"126809"},{"objectID":"not-a-number"},{"objectID":"7059569"}]}"#;
    let base = fake_api(vec![("/search/search_by_date", 200, body.to_string())]);
    let client = client_for(&base);
    assert_eq!(client.story_ids(Category::Polls).unwrap(), vec![126809, 7059569]);
}

#[test]
fn updates_snapshot_decodes() {
    let body = r#"{"items":[101,102],"profiles":["pg","dhouston"]}"#;
    let base = fake_api(vec![("/v0/updates.json", 200, body.to_string())]);
    let client = client_for(&base);
    let updates = client.updates().unwrap();
    assert_eq!(updates.items, vec![101, 102]);
    assert_eq!(updates.profiles.len(), 2);
}

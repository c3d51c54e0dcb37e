//! HTTP engine client against a mock Solr server

use cms_search::engine::{EngineError, EngineQuery, SearchEngine, SolrClient};
use mockito::{Matcher, Server};
use serde_json::{json, Map, Value};

fn client(server: &Server) -> SolrClient {
    SolrClient::new(format!("{}/solr/cms/", server.url()), 5).unwrap()
}

#[tokio::test]
async fn test_query_sends_params_and_decodes_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/solr/cms/select")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "budget".into()),
            Matcher::UrlEncoded("fq".into(), "type:\"PAGE\"".into()),
            Matcher::UrlEncoded("rows".into(), "0".into()),
            Matcher::UrlEncoded("wt".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "responseHeader": {"status": 0, "QTime": 3},
                "response": {"numFound": 17, "start": 0, "docs": []}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut query = EngineQuery::new("budget");
    query.add("fq", "type:\"PAGE\"").set_rows(0);

    let response = client(&server).query(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.num_found(), 17);
}

#[tokio::test]
async fn test_writes_post_update_commands() {
    let mut server = Server::new_async().await;
    let add = server
        .mock("POST", "/solr/cms/update")
        .match_query(Matcher::UrlEncoded("wt".into(), "json".into()))
        .match_body(Matcher::Json(json!([{"uid": "intranet_1_DOCUMENT"}])))
        .with_status(200)
        .create_async()
        .await;
    let delete = server
        .mock("POST", "/solr/cms/update")
        .match_query(Matcher::UrlEncoded("wt".into(), "json".into()))
        .match_body(Matcher::Json(json!({"delete": {"query": "uid:intranet_*"}})))
        .with_status(200)
        .create_async()
        .await;
    let commit = server
        .mock("POST", "/solr/cms/update")
        .match_query(Matcher::UrlEncoded("wt".into(), "json".into()))
        .match_body(Matcher::Json(json!({"commit": {}})))
        .with_status(200)
        .create_async()
        .await;

    let engine = client(&server);
    let mut doc = Map::new();
    doc.insert("uid".to_string(), Value::from("intranet_1_DOCUMENT"));

    engine.add(vec![doc]).await.unwrap();
    engine.delete_by_query("uid:intranet_*").await.unwrap();
    engine.commit().await.unwrap();

    add.assert_async().await;
    delete.assert_async().await;
    commit.assert_async().await;
}

#[tokio::test]
async fn test_empty_add_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/solr/cms/update")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    client(&server).add(Vec::new()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_engine_error_message_is_surfaced() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/solr/cms/select")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(json!({"error": {"msg": "undefined field foo", "code": 400}}).to_string())
        .create_async()
        .await;

    let err = client(&server)
        .query(&EngineQuery::new("foo:bar"))
        .await
        .unwrap_err();

    match err {
        EngineError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "undefined field foo");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/solr/cms/select")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let err = client(&server)
        .query(&EngineQuery::new("*:*"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_engine_is_a_transport_error() {
    let engine = SolrClient::new("http://127.0.0.1:1/solr/cms", 2).unwrap();

    let err = engine.commit().await.unwrap_err();

    assert!(matches!(err, EngineError::Transport(_)));
}

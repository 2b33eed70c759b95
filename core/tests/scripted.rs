//! Client behaviour against scripted responses: classification of failures,
//! what gets reported, and connection release on every path.

mod common;

use book_client::{
    ApiError, BookApiClient, BookFilter, HttpMethod, HttpResponse, ImportReport, IsbnLookup,
    Severity,
};
use common::{RecordingSink, Scripted};
use rstest::rstest;

fn client(transport: &std::sync::Arc<Scripted>) -> (BookApiClient, RecordingSink) {
    let sink = RecordingSink::default();
    let client = BookApiClient::with_transport(
        "http://books.test/api",
        transport.clone(),
        sink.clone(),
    );
    (client, sink)
}

const NOT_FOUND_BODY: &str = r#"{"status":404,"error":"Not Found","message":"Book 9 not found","path":"/api/book/9","timestamp":"2024-03-01T10:15:30.123"}"#;

#[test]
fn search_rejection_surfaces_server_body() {
    let transport = Scripted::replying(vec![
        Ok(HttpResponse::new(404, NOT_FOUND_BODY)),
        Ok(HttpResponse::new(404, NOT_FOUND_BODY)),
    ]);
    let (client, sink) = client(&transport);

    let err = client
        .try_search(&BookFilter {
            id: Some(9),
            ..Default::default()
        })
        .unwrap_err();
    let server = err.server_error().unwrap();
    assert_eq!(server.status, 404);
    assert_eq!(server.message, "Book 9 not found");

    assert_eq!(client.search(&BookFilter::default()), None);
    let shown = sink.messages();
    assert_eq!(
        shown[0].0,
        "Error: Book 9 not found\nStatus: 404\nPath: /api/book/9"
    );
    assert_eq!(shown[0].2, Severity::Error);
    assert_eq!(transport.released(), 2);
}

#[rstest]
#[case::bad_gateway(502, "<html>bad gateway</html>")]
#[case::empty_teapot(418, "")]
fn unparsable_error_status_is_a_transport_failure(#[case] status: u16, #[case] body: &str) {
    let transport = Scripted::replying(vec![Ok(HttpResponse::new(status, body))]);
    let (client, _sink) = client(&transport);

    let err = client.try_delete(1).unwrap_err();
    match err {
        ApiError::TransportFailure { status: Some(code), .. } => assert_eq!(code, status),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(transport.released(), 1);
}

#[test]
fn malformed_body_is_a_decode_failure() {
    let transport = Scripted::replying(vec![Ok(HttpResponse::new(200, "{\"books\": 3}"))]);
    let (client, sink) = client(&transport);

    assert_eq!(client.import_csv_bytes("books.csv", b"isbn,title\n"), None);
    let shown = sink.messages();
    assert!(shown[0].0.starts_with("An unexpected error occurred: deserialization failed"));
    assert_eq!(shown[0].1, "Error importing CSV");
    assert_eq!(transport.released(), 1);
}

#[test]
fn transport_error_still_releases_the_connection() {
    let transport = Scripted::replying(vec![Err(ApiError::TransportFailure {
        status: None,
        reason: "connection reset".to_string(),
    })]);
    let (client, sink) = client(&transport);

    assert_eq!(client.lookup_by_isbn("9780306406157"), IsbnLookup::Failed);
    assert_eq!(transport.released(), 1);
    let shown = sink.messages();
    assert_eq!(shown.len(), 1);
    assert_eq!(
        shown[0].0,
        "An unexpected error occurred: transport failure: connection reset"
    );
    assert_eq!(shown[0].1, "Error querying Open Library");
}

#[rstest]
#[case::html_page("<html><body>Whitelabel Error Page</body></html>")]
#[case::empty_body("")]
fn lookup_404_without_error_body_is_a_failure(#[case] body: &str) {
    let transport = Scripted::replying(vec![Ok(HttpResponse::new(404, body))]);
    let (client, sink) = client(&transport);

    assert_eq!(client.lookup_by_isbn("9780306406157"), IsbnLookup::Failed);
    let shown = sink.messages();
    assert_eq!(shown.len(), 1);
    assert_eq!(
        shown[0].0,
        "An unexpected error occurred: HTTP error 404"
    );
    assert_eq!(shown[0].1, "Error querying Open Library");
    assert_eq!(shown[0].2, Severity::Error);
    assert_eq!(transport.released(), 1);
}

#[test]
fn lookup_404_with_error_body_is_not_found() {
    let transport = Scripted::replying(vec![Ok(HttpResponse::new(404, NOT_FOUND_BODY))]);
    let (client, sink) = client(&transport);

    assert_eq!(client.lookup_by_isbn("9780306406157"), IsbnLookup::NotFound);
    let shown = sink.messages();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "No book found for ISBN 9780306406157");
    assert_eq!(shown[0].2, Severity::Warning);
}

#[test]
fn import_outcome_becomes_a_report() {
    let transport = Scripted::replying(vec![Ok(HttpResponse::new(
        200,
        r#"{"books":[{"id":1,"isbn":"9780306406157","title":"A","authors":[],"publishers":[]}],
            "errors":[{"lineNumber":3,"lineContent":"bad,row","message":"missing isbn"}]}"#,
    ))]);
    let (client, sink) = client(&transport);

    let outcome = client
        .import_csv_bytes("books.csv", b"isbn,title\n9780306406157,A\nbad,row\n")
        .unwrap();
    let report = ImportReport::from_outcome(&outcome);
    assert!(report
        .summary
        .starts_with("Import finished successfully, some items were not created or updated."));
    assert!(report.summary.contains("Imported: 1"));
    assert!(report.summary.contains("Errors: 1"));
    assert_eq!(report.error_rows, vec![vec!["3", "bad,row", "missing isbn"]]);
    assert!(sink.messages().is_empty());

    let sent = transport.requests.lock().unwrap();
    assert_eq!(sent[0].method, HttpMethod::Post);
    assert_eq!(sent[0].url, "http://books.test/api/book/import");
}

#[test]
fn one_request_per_operation() {
    let transport = Scripted::replying(vec![
        Ok(HttpResponse::new(200, "[]")),
        Ok(HttpResponse::new(204, "")),
        Ok(HttpResponse::new(200, "null")),
    ]);
    let (client, sink) = client(&transport);

    assert_eq!(client.search(&BookFilter::default()), Some(Vec::new()));
    assert!(client.delete(3));
    assert_eq!(client.lookup_by_isbn("0306406152"), IsbnLookup::NotFound);

    assert_eq!(transport.sent(), 3);
    assert_eq!(transport.released(), 3);
    assert_eq!(sink.messages().len(), 1);
}

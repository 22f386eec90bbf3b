use licensure_scrapers::{FloridaStrategy, LicenseStrategy, LookupContext, LookupError};
use licensure_session::SessionFactory;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(rows: usize) -> String {
    let rows: String = (1..=rows)
        .map(|i| {
            format!(
                "<tr><td><a href=\"/Licensee/{i}\">DOE, JANE {i}</a></td><td>W{i:06}</td>\
                 <td>Jacksonville</td></tr>"
            )
        })
        .collect();
    format!(
        "<html><body><table class=\"table table-striped\">\
         <thead><tr><th>Name</th><th>License #</th><th>City</th></tr></thead>\
         <tbody>{rows}</tbody></table></body></html>"
    )
}

const DETAIL_PAGE: &str = r#"<html><body>
  <div class="form-group"><label class="control-label">NPN #:</label><div class="col-md-8">7654321</div></div>
  <div class="form-group"><label class="control-label">Email:</label><div class="col-md-8">jane@example.com</div></div>
  <div class="form-group"><label class="control-label">County:</label><div class="col-md-8">DUVAL</div></div>
  <div class="panel panel-default">
    <div class="panel-heading">Invalid Licenses</div>
    <table class="table"><tbody><tr><td>Life</td><td>01/01/2001</td><td></td></tr></tbody></table>
  </div>
  <div class="panel panel-default">
    <div class="panel-heading">Valid Licenses</div>
    <table class="table"><tbody><tr><td>Property</td><td>02/02/2020</td><td>Yes</td></tr></tbody></table>
  </div>
  <div class="panel panel-default">
    <div class="panel-heading">Active Appointments</div>
    <table class="table"><tbody><tr><td>ACME INS</td><td>02/03/2020</td><td>03/31/2027</td><td>02/03/2020</td></tr></tbody></table>
  </div>
</body></html>"#;

async fn florida_server(results: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "ASP.NET_SessionId=fl-session; Path=/")
                .set_body_string("<form></form>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header_exists("cookie"))
        .and(body_string_contains("IndividualLNameFilter=Doe"))
        .and(body_string_contains("hdnLicenseeSearchListUrl="))
        .respond_with(ResponseTemplate::new(200).set_body_string(results))
        .mount(&server)
        .await;
    server
}

fn strategy(server: &MockServer) -> FloridaStrategy {
    FloridaStrategy::new(server.uri(), SessionFactory::default(), 5)
}

async fn detail_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/Licensee/"))
        .count()
}

#[tokio::test]
async fn test_eight_rows_yield_five_enriched_records() {
    let server = florida_server(results_page(8)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/Licensee/\d+$"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let records = strategy(&server)
        .lookup_by_name(&LookupContext::new(), "Jane", "Doe")
        .await
        .unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(detail_requests(&server).await, 5);

    let first = &records[0];
    assert!(first.found);
    assert_eq!(first.state, "FL");
    assert_eq!(first.full_name, "DOE, JANE 1");
    assert_eq!(first.license_number, "W000001");
    assert_eq!(first.national_id, "7654321");
    assert_eq!(first.email, "jane@example.com");
    assert_eq!(first.county, "DUVAL");
    assert_eq!(first.license_type, "Property");
    assert_eq!(first.status, "VALID");
    assert!(first.active);
    assert_eq!(first.issue_date, "02/02/2020");
    assert_eq!(first.expiration_date, "03/31/2027");
    assert!(first.error.is_empty());
}

#[tokio::test]
async fn test_no_results_text_short_circuits() {
    let server = florida_server(
        "<html><body><div class=\"alert\">No Licensee records match your criteria.</div>\
         <table class=\"table\"><tbody><tr><td><a href=\"/Licensee/1\">stale</a></td><td>W1</td></tr></tbody></table>\
         </body></html>"
            .to_string(),
    )
    .await;

    let records = strategy(&server)
        .lookup_by_name(&LookupContext::new(), "Jane", "Doe")
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(!records[0].found);
    assert_eq!(records[0].state, "FL");
    assert_eq!(detail_requests(&server).await, 0);
}

#[tokio::test]
async fn test_detail_failure_is_partial() {
    let server = florida_server(results_page(2)).await;
    Mock::given(method("GET"))
        .and(path("/Licensee/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Licensee/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let records = strategy(&server)
        .lookup_by_name(&LookupContext::new(), "Jane", "Doe")
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0].found);
    assert_eq!(records[0].full_name, "DOE, JANE 1");
    assert!(records[0].error.contains("HTTP 500"), "got {:?}", records[0].error);
    assert!(records[0].status.is_empty());
    assert!(records[1].error.is_empty());
    assert_eq!(records[1].status, "VALID");
}

#[tokio::test]
async fn test_search_non_200_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = strategy(&server)
        .lookup_by_npn(&LookupContext::new(), "1234567")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LookupError::Http {
            step: "search",
            status: 502,
            ..
        }
    ));
}

#[tokio::test]
async fn test_npn_and_license_number_fill_their_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("NPNNoFilter=1234567"))
        .respond_with(ResponseTemplate::new(200).set_body_string("No results"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("FLLicenseNoFilter=W123456"))
        .respond_with(ResponseTemplate::new(200).set_body_string("No results"))
        .expect(1)
        .mount(&server)
        .await;

    let strategy = strategy(&server);
    let ctx = LookupContext::new();
    assert!(!strategy.lookup_by_npn(&ctx, "1234567").await.unwrap()[0].found);
    assert!(
        !strategy
            .lookup_by_license_number(&ctx, "W123456")
            .await
            .unwrap()[0]
            .found
    );
}

#[tokio::test]
async fn test_cancellation_aborts_detail_crawl() {
    let server = florida_server(results_page(3)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/Licensee/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(DETAIL_PAGE)
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let ctx = LookupContext::new();
    let cancel = ctx.cancel_token().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let err = strategy(&server)
        .lookup_by_name(&ctx, "Jane", "Doe")
        .await
        .unwrap_err();

    assert!(matches!(err, LookupError::Cancelled { step: "detail", .. }), "got {err:?}");
}

#[tokio::test]
async fn test_deadline_applies_to_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let ctx = LookupContext::new().with_timeout(Duration::from_millis(200));
    let err = strategy(&server)
        .lookup_by_name(&ctx, "Jane", "Doe")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LookupError::DeadlineExceeded {
            step: "search_page",
            ..
        }
    ));
}

use autopay::domain::{
    PaymentCancelRequest, PaymentQueryRequest, RefundQueryRequest,
};
use autopay::http::USER_AGENT;
use autopay::prelude::*;
use chrono::{TimeZone, Utc};
use futures::io::Cursor;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointed at the mock server with a gate that never throttles the tests
fn client_for(server: &MockServer) -> AutoPayClient {
    let config = Config::sandbox("test-key", "test-secret")
        .with_base_url(server.uri())
        .with_rate_limit(1_000, 100);
    AutoPayClient::new(config).unwrap()
}

fn payment(out_trade_no: &str) -> PaymentRequest {
    PaymentRequest::new(
        out_trade_no,
        Amount::from_units(10),
        Currency::Cny,
        "Coffee",
        PaymentMethod::Alipay,
    )
}

fn paid(out_trade_no: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "out_trade_no": out_trade_no,
        "trade_no": format!("T-{out_trade_no}"),
        "status": "PAID",
        "total_amount": 10.0,
        "currency": "CNY"
    }))
}

#[tokio::test]
async fn create_payment_sends_auth_headers_and_default_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payments"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", USER_AGENT))
        .and(body_partial_json(json!({
            "out_trade_no": "ORDER-1",
            "timeout": 900_000_000_000u64
        })))
        .respond_with(paid("ORDER-1"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let resp = client
        .payments()
        .create(&Context::new(), &payment("ORDER-1"))
        .await
        .unwrap();

    assert!(resp.is_paid());
    assert_eq!(resp.trade_no, "T-ORDER-1");
    assert_eq!(resp.total_amount, Amount::from_units(10));
}

#[tokio::test]
async fn invalid_payment_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(paid("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut req = payment("ORDER-1");
    req.subject.clear();

    let err = client
        .payments()
        .create(&Context::new(), &req)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(client.stats().request_count, 0);
}

#[tokio::test]
async fn query_and_cancel_use_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/query"))
        .and(query_param("out_trade_no", "ORDER-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "out_trade_no": "ORDER-1",
            "status": "PENDING",
            "refund_amount": 0.5
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/payments/cancel"))
        .and(body_partial_json(json!({"trade_no": "T-1", "reason": "changed mind"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trade_no": "T-1",
            "status": "CANCELLED",
            "success": true
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = Context::new();
    let payments = client.payments();

    let queried = payments
        .query(&ctx, &PaymentQueryRequest::by_out_trade_no("ORDER-1"))
        .await
        .unwrap();
    assert_eq!(queried.payment.status, OrderStatus::Pending);
    assert_eq!(queried.refund_amount.to_decimal_string(), "0.5000");
    assert!(queried.query_time.is_some());

    let cancelled = payments
        .cancel(
            &ctx,
            &PaymentCancelRequest {
                trade_no: "T-1".to_string(),
                reason: "changed mind".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cancelled.success);
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn statistics_sends_date_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/statistics"))
        .and(query_param("start_date", "2024-01-01T00:00:00Z"))
        .and(query_param("end_date", "2024-01-31T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "success_count": 2,
            "statistics_data": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let window = StatisticsRequest::between(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
    );
    let stats = client
        .payments()
        .statistics(&Context::new(), &window)
        .await
        .unwrap();

    assert_eq!(stats.total_count, 3);
    assert_eq!(stats.success_count, 2);
    assert!(stats.statistics_data.is_empty());
}

#[tokio::test]
async fn api_error_surfaces_server_message_and_counts_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payments"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": "DUPLICATE",
            "message": "order already exists"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .payments()
        .create(&Context::new(), &payment("ORDER-1"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(
        err.to_string(),
        "API error (HTTP 422): order already exists"
    );

    let stats = client.stats();
    assert_eq!(stats.request_count, 1);
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.active_requests, 0);
}

#[tokio::test]
async fn batch_reports_each_item_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payments"))
        .and(body_partial_json(json!({"out_trade_no": "ORDER-2"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    for id in ["ORDER-1", "ORDER-4", "ORDER-5"] {
        Mock::given(method("POST"))
            .and(path("/v1/payments"))
            .and(body_partial_json(json!({"out_trade_no": id})))
            .respond_with(paid(id))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut invalid = payment("ORDER-3");
    invalid.subject.clear();
    let requests = vec![
        payment("ORDER-1"),
        payment("ORDER-2"),
        invalid,
        payment("ORDER-4"),
        payment("ORDER-5"),
    ];

    let client = client_for(&server);
    let result = client
        .batch_process(&Context::new(), BatchRequest::Payments(requests), 2)
        .await
        .unwrap();
    let BatchResult::Payments(summary) = result else {
        panic!("expected a payment summary");
    };

    assert_eq!(summary.total_count, 5);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failed_count, 2);
    assert!(summary.is_completed());
    assert!(summary.batch_id.starts_with("batch_"));

    let ids: Vec<_> = summary.results.iter().map(|r| r.out_trade_no.as_str()).collect();
    assert_eq!(ids, ["ORDER-1", "ORDER-4", "ORDER-5"]);

    let failures: Vec<_> = summary.failures.iter().map(|f| (f.index, f.kind)).collect();
    assert_eq!(
        failures,
        [(1, FailureKind::Execution), (2, FailureKind::Validation)]
    );
    assert_eq!(
        summary.failures[1].to_string(),
        "request 2 validation failed: subject must not be empty"
    );

    // The invalid item never produced a request
    assert_eq!(client.stats().request_count, 4);
}

#[tokio::test]
async fn single_requests_and_batches_share_one_rate_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payments"))
        .respond_with(paid("ORDER"))
        .expect(4)
        .mount(&server)
        .await;

    // One admission up front, then one every 100ms
    let config = Config::sandbox("test-key", "test-secret")
        .with_base_url(server.uri())
        .with_rate_limit(10, 1);
    let client = AutoPayClient::new(config).unwrap();
    let ctx = Context::new();

    let started = std::time::Instant::now();
    let batch_items = vec![payment("ORDER-1"), payment("ORDER-2"), payment("ORDER-3")];
    let single_item = payment("ORDER-4");
    let payments = client.payments();
    let (batch, single) = tokio::join!(
        payments.batch_create(&ctx, batch_items, 3),
        payments.create(&ctx, &single_item),
    );
    let elapsed = started.elapsed();

    assert_eq!(batch.unwrap().success_count, 3);
    assert!(single.is_ok());
    // Separate budgets would finish in about 200ms; a shared one needs 300ms
    assert!(
        elapsed >= std::time::Duration::from_millis(280),
        "four requests finished in {elapsed:?}"
    );
}

#[tokio::test]
async fn csv_batch_round_trip_writes_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/refunds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "out_trade_no": "ORDER-1",
            "refund_no": "R-1",
            "status": "SUCCESS"
        })))
        .mount(&server)
        .await;

    let csv_data = "\
out_trade_no,trade_no,refund_amount,currency,refund_reason,notify_url
ORDER-1,,5.00,CNY,damaged,
ORDER-2,,0,CNY,damaged,
";
    let items = RefundCsvStream::new(Cursor::new(csv_data.as_bytes().to_vec()))
        .collect_batch()
        .await;
    let references: Vec<String> = items.iter().map(|r| r.reference().to_string()).collect();

    let client = client_for(&server);
    let summary = client
        .refunds()
        .batch_create(&Context::new(), items, 0)
        .await
        .unwrap();

    let mut output = Vec::new();
    write_report(&summary, &references, &mut output).await.unwrap();
    let report = String::from_utf8(output).unwrap();

    assert_eq!(
        report,
        "index,status,reference,detail\n\
         0,SUCCESS,ORDER-1,SUCCESS R-1\n\
         1,FAILED,ORDER-2,validation failed: amount must be greater than 0\n"
    );
}

#[tokio::test]
async fn refund_query_sends_every_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/refunds/query"))
        .and(query_param("out_trade_no", "ORDER-1"))
        .and(query_param("refund_no", "R-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refund_no": "R-1",
            "status": "PROCESSING",
            "remaining_amount": 2.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let resp = client
        .refunds()
        .query(
            &Context::new(),
            &RefundQueryRequest {
                out_trade_no: "ORDER-1".to_string(),
                refund_no: "R-1".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(resp.refund.status, RefundStatus::Processing);
    assert_eq!(resp.remaining_amount, Amount::from_decimal_str("2.5").unwrap());
}

#[tokio::test]
async fn channel_compare_posts_codes_and_criteria() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/channels/compare"))
        .and(body_json(json!({
            "channels": ["alipay", "paypal"],
            "criteria": ["fee"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "channels": null,
            "recommended": "alipay"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let channels = client.channels();
    let ctx = Context::new();

    let comparison = channels
        .compare(
            &ctx,
            &[ChannelCode::from(ChannelCode::ALIPAY), ChannelCode::from(ChannelCode::PAYPAL)],
            &["fee".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(comparison.recommended, "alipay");
    assert!(comparison.channels.is_empty());
    assert!(comparison.generated_at.is_some());

    let err = channels.compare(&ctx, &[], &[]).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn health_check_requires_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.health_check(&Context::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(204));
}

#[tokio::test]
async fn cancelled_context_fails_every_batch_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(paid("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = Context::new();
    ctx.cancel();

    let client = client_for(&server);
    let summary = client
        .payments()
        .batch_create(&ctx, vec![payment("ORDER-1"), payment("ORDER-2")], 0)
        .await
        .unwrap();

    assert_eq!(summary.success_count, 0);
    assert!(summary.all_failed());
    assert!(
        summary
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::Admission)
    );
}

mod common;

use axum::http::Method;
use packing_report_api::entities::report_item;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

use common::{decimal, report_payload, response_json, TestApp};

fn challans(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .expect("report list")
        .iter()
        .map(|r| r["challanNo"].as_i64().expect("challan"))
        .collect()
}

#[tokio::test]
async fn create_computes_net_weights_and_totals() {
    let app = TestApp::new().await;
    let client_id = app.create_client("FAZE THREE LTD").await;

    let mut payload = report_payload(
        client_id,
        "2024-03-05",
        &[(2, "20.125", "0.5"), (1, "25.5", "1.25"), (3, "1.0", "1.5")],
    );
    payload["report"]["vehicleNo"] = json!("GJ05AB1234");
    let data = app.create_report(payload).await;

    let report = &data["report"];
    assert_eq!(report["challanNo"], 1);
    assert_eq!(report["clientName"], "FAZE THREE LTD");
    assert_eq!(report["vehicleNo"], "GJ05AB1234");
    assert_eq!(report["totalBags"], 3);
    assert_eq!(report["totalCones"], 36);
    assert_eq!(decimal(&report["totalGrossWeight"]), dec!(46.625));
    assert_eq!(decimal(&report["totalTareWeight"]), dec!(3.25));
    // gross below tare nets to zero
    assert_eq!(decimal(&report["totalNetWeight"]), dec!(43.875));

    let items = data["items"].as_array().unwrap();
    let bags: Vec<i64> = items.iter().map(|i| i["bagNo"].as_i64().unwrap()).collect();
    assert_eq!(bags, vec![1, 2, 3]);
    assert_eq!(decimal(&items[0]["netWeight"]), dec!(24.25));
    assert_eq!(decimal(&items[2]["netWeight"]), dec!(0));
    assert_eq!(items[0]["qualityName"], "Rct 277");
    assert_eq!(items[0]["shadeNumber"], "S001");
}

#[tokio::test]
async fn challan_numbers_follow_the_highest() {
    let app = TestApp::new().await;
    let client_id = app.create_client("3AT INDIA INC").await;

    let mut explicit = report_payload(client_id, "2024-03-01", &[(1, "10", "1")]);
    explicit["report"]["challanNo"] = json!(41);
    assert_eq!(app.create_report(explicit).await["report"]["challanNo"], 41);

    let next = app
        .create_report(report_payload(client_id, "2024-03-02", &[(1, "10", "1")]))
        .await;
    assert_eq!(next["report"]["challanNo"], 42);
}

#[tokio::test]
async fn invalid_reports_leave_nothing_behind() {
    let app = TestApp::new().await;
    let client_id = app.create_client("FAZE THREE LTD").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(report_payload(9_999, "2024-03-05", &[(1, "25.5", "1.25")])),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(response_json(response).await["message"], "Client not found");

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(report_payload(
                client_id,
                "2024-03-05",
                &[(1, "25.5", "1.25"), (2, "0", "1")],
            )),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["details"][0], "items[1].gross_weight: must be greater than 0");

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(report_payload(client_id, "2024-03-05", &[])),
        )
        .await;
    assert_eq!(response.status(), 400);

    let mut mismatched = report_payload(client_id, "2024-03-05", &[(1, "25.5", "1.25")]);
    mismatched["report"]["totalNetWeight"] = json!("30");
    let response = app
        .request(Method::POST, "/api/v1/reports", Some(mismatched))
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    let problem = body["details"][0].as_str().unwrap();
    assert!(problem.starts_with("report.total_net_weight: expected 24.25"));

    let reports = response_json(app.get("/api/v1/reports").await).await;
    assert!(reports["data"].as_array().unwrap().is_empty());
    let stored_items = report_item::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(stored_items, 0);
}

#[tokio::test]
async fn update_replaces_items_and_keeps_challan() {
    let app = TestApp::new().await;
    let first = app.create_client("FAZE THREE LTD").await;
    let second = app.create_client("ABDUL SAMAD SHABAN").await;

    let created = app
        .create_report(report_payload(
            first,
            "2024-03-05",
            &[(1, "25.5", "1.25"), (2, "20.125", "0.5")],
        ))
        .await;
    let id = created["report"]["id"].as_i64().unwrap();

    let mut payload = report_payload(second, "2024-03-06", &[(7, "30", "2")]);
    payload["report"]["totalBags"] = json!(1);
    payload["items"][0]["netWeight"] = json!("28.000");
    let response = app
        .request(Method::PUT, &format!("/api/v1/reports/{}", id), Some(payload))
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let report = &body["data"]["report"];
    assert_eq!(report["challanNo"], 1);
    assert_eq!(report["clientName"], "ABDUL SAMAD SHABAN");
    assert_eq!(report["reportDate"], "2024-03-06");
    assert_eq!(report["totalBags"], 1);
    assert_eq!(decimal(&report["totalNetWeight"]), dec!(28));
    assert!(report["updatedAt"].is_string());

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["bagNo"], 7);

    let stored_items = report_item::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(stored_items, 1);

    let response = app
        .request(
            Method::PUT,
            "/api/v1/reports/777",
            Some(report_payload(second, "2024-03-06", &[(1, "30", "2")])),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn delete_removes_report_and_items() {
    let app = TestApp::new().await;
    let client_id = app.create_client("FAZE THREE LTD").await;
    let created = app
        .create_report(report_payload(
            client_id,
            "2024-03-05",
            &[(1, "25.5", "1.25"), (2, "20.125", "0.5")],
        ))
        .await;
    let id = created["report"]["id"].as_i64().unwrap();

    let response = app
        .request(Method::DELETE, &format!("/api/v1/reports/{}", id), None)
        .await;
    assert_eq!(response.status(), 204);
    assert_eq!(
        app.get(&format!("/api/v1/reports/{}", id)).await.status(),
        404
    );
    let stored_items = report_item::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(stored_items, 0);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/reports/{}", id), None)
        .await;
    assert_eq!(response.status(), 404);

    // The client is free again
    let response = app
        .request(Method::DELETE, &format!("/api/v1/clients/{}", client_id), None)
        .await;
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn reports_are_filtered_and_searched() {
    let app = TestApp::new().await;
    let faze = app.create_client("FAZE THREE LTD").await;
    let dicitex = app.create_client("DICITEX FURNISHING PVT LTD").await;

    let mut january = report_payload(faze, "2024-01-15", &[(1, "10", "1")]);
    january["report"]["challanNo"] = json!(101);
    app.create_report(january).await;

    let mut february = report_payload(dicitex, "2024-02-10", &[(1, "10", "1"), (2, "12", "1")]);
    february["report"]["challanNo"] = json!(202);
    february["items"][1]["qualityName"] = json!("Plt 193");
    app.create_report(february).await;

    let mut march = report_payload(faze, "2024-03-20", &[(1, "10", "1")]);
    march["report"]["challanNo"] = json!(303);
    march["report"]["qualityName"] = json!("Vct 452");
    app.create_report(march).await;

    let all = response_json(app.get("/api/v1/reports").await).await;
    assert_eq!(challans(&all), vec![303, 202, 101]);
    assert_eq!(all["data"][0]["clientName"], "FAZE THREE LTD");
    assert!(all["data"][0].get("clientAddress").is_none());

    let by_client = response_json(app.get(&format!("/api/v1/reports?clientId={}", faze)).await).await;
    assert_eq!(challans(&by_client), vec![303, 101]);

    let by_item_quality =
        response_json(app.get("/api/v1/reports?qualityName=Plt%20193").await).await;
    assert_eq!(challans(&by_item_quality), vec![202]);

    let by_dates = response_json(
        app.get("/api/v1/reports?startDate=2024-02-01&endDate=2024-03-20")
            .await,
    )
    .await;
    assert_eq!(challans(&by_dates), vec![303, 202]);

    let by_challan = response_json(app.get("/api/v1/reports?q=20").await).await;
    assert_eq!(challans(&by_challan), vec![202]);

    let by_name = response_json(app.get("/api/v1/reports?searchTerm=DICITEX").await).await;
    assert_eq!(challans(&by_name), vec![202]);

    let combined = response_json(
        app.get(&format!("/api/v1/reports?clientId={}&q=Vct", faze))
            .await,
    )
    .await;
    assert_eq!(challans(&combined), vec![303]);

    let empty_client = response_json(app.get("/api/v1/reports?clientId=").await).await;
    assert_eq!(challans(&empty_client).len(), 3);
}

#[tokio::test]
async fn malformed_filters_are_rejected() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/reports?startDate=05-03-2024").await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["message"],
        "Invalid startDate: expected YYYY-MM-DD"
    );

    let response = app
        .get("/api/v1/reports?startDate=2024-03-01&endDate=2024-02-01")
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["message"],
        "startDate must not be after endDate"
    );

    assert_eq!(app.get("/api/v1/reports/123").await.status(), 404);
}

#[tokio::test]
async fn search_wildcards_are_matched_literally() {
    let app = TestApp::new().await;
    let plain = app.create_client("FAZE THREE LTD").await;
    let percent = app.create_client("100% COTTON MILLS").await;

    let mut first = report_payload(plain, "2024-03-05", &[(1, "10", "1")]);
    first["report"]["challanNo"] = json!(11);
    app.create_report(first).await;
    let mut second = report_payload(percent, "2024-03-06", &[(1, "10", "1")]);
    second["report"]["challanNo"] = json!(12);
    app.create_report(second).await;

    // `%25` is a URL-encoded percent sign
    let by_percent = response_json(app.get("/api/v1/reports?q=%25").await).await;
    assert_eq!(challans(&by_percent), vec![12]);
    let by_underscore = response_json(app.get("/api/v1/reports?q=_").await).await;
    assert!(challans(&by_underscore).is_empty());

    let clients = response_json(app.get("/api/v1/clients?search=%25").await).await;
    let names: Vec<&str> = clients["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["100% COTTON MILLS"]);

    let qualities = response_json(app.get("/api/v1/qualities?search=_").await).await;
    assert!(qualities["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_reports_are_validation_errors() {
    let app = TestApp::new().await;
    let client_id = app.create_client("FAZE THREE LTD").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(report_payload(
                client_id,
                "2024-03-05",
                &[(1, "6000000", "1"), (2, "6000000", "1")],
            )),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(
        body["details"][0],
        "report.total_gross_weight: sum of items must be at most 9999999.999"
    );

    let mut payload = report_payload(client_id, "2024-03-05", &[(1, "10", "1"), (2, "10", "1")]);
    payload["items"][0]["cones"] = json!(2_000_000_000);
    payload["items"][1]["cones"] = json!(2_000_000_000);
    let response = app
        .request(Method::POST, "/api/v1/reports", Some(payload))
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(report_payload(client_id, "2024-03-05", &[(1, "0.0004", "0")])),
        )
        .await;
    assert_eq!(response.status(), 400);

    let reports = response_json(app.get("/api/v1/reports").await).await;
    assert!(reports["data"].as_array().unwrap().is_empty());
}

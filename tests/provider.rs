//! End-to-end provider behaviour against a mocked Robot webservice.

use std::time::Duration;

use hemmer_provider_hetznerrobot::testing::{
    assert_error_contains, assert_plan_changes_attribute, assert_plan_creates,
    assert_plan_replaces, ProviderTester, TestError,
};
use hemmer_provider_hetznerrobot::{
    HetznerRobotProvider, PortWait, ProviderError, Timeouts, WaitPolicy,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_timeouts() -> Timeouts {
    Timeouts {
        firewall: WaitPolicy::new(3, Duration::from_millis(1)),
        vswitch: WaitPolicy::new(3, Duration::from_millis(1)),
        ssh: PortWait {
            port: 22,
            deadline: Duration::from_millis(200),
            interval: Duration::from_millis(10),
            connect_timeout: Duration::from_millis(100),
        },
        power_on_delay: Duration::ZERO,
    }
}

async fn configured(mock: &MockServer) -> ProviderTester<HetznerRobotProvider> {
    let tester = ProviderTester::new(HetznerRobotProvider::with_timeouts(fast_timeouts()));
    assert_ok!(
        tester
            .configure(json!({"username": "robot", "password": "secret", "url": mock.uri()}))
            .await
    );
    tester
}

fn vswitch_body(id: i64, servers: &[(i64, &str)]) -> Value {
    json!({
        "id": id,
        "name": "lan",
        "vlan": 4000,
        "cancelled": false,
        "server": servers
            .iter()
            .map(|(n, status)| json!({"server_number": n, "status": status}))
            .collect::<Vec<_>>(),
        "subnet": [],
        "cloud_network": []
    })
}

async fn mount_server(mock: &MockServer, number: i64, ip: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/server/{}", number)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "server": {
                "server_ip": ip,
                "server_number": number,
                "server_name": format!("server-{}", number),
                "product": "AX41",
                "dc": "FSN1-DC14",
                "traffic": "unlimited",
                "status": "ready",
                "cancelled": false,
                "paid_until": "2026-12-31"
            }
        })))
        .mount(mock)
        .await;
}

#[tokio::test]
async fn vswitch_create_and_grow() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;

    Mock::given(method("POST"))
        .and(path("/vswitch"))
        .and(body_string("name=lan&vlan=4000"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vswitch_body(12, &[])))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/vswitch/12/server"))
        .and(body_string("server%5B%5D=1&server%5B%5D=3"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/vswitch/12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vswitch_body(12, &[(1, "ready"), (3, "failed")])),
        )
        .up_to_n_times(3)
        .mount(&mock)
        .await;

    let config = json!({"name": "lan", "vlan": 4000, "servers": [3, 1]});
    let plan = tester
        .plan_create("hetznerrobot_vswitch", config.clone())
        .await
        .unwrap();
    assert_plan_creates(&plan);
    assert_eq!(plan.planned_state["servers"], json!([1, 3]));

    let state = tester
        .lifecycle_create("hetznerrobot_vswitch", config)
        .await
        .unwrap();
    assert_eq!(state["id"], "12");
    assert_eq!(state["servers"], json!([1, 3]));
    assert_eq!(
        state["incidents"],
        json!(["Server 3 failed to connect. Please check in the Hetzner web interface."])
    );

    Mock::given(method("DELETE"))
        .and(path("/vswitch/12/server"))
        .and(body_string("server%5B%5D=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/vswitch/12/server"))
        .and(body_string("server%5B%5D=4"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/vswitch/12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vswitch_body(12, &[(3, "ready"), (4, "ready")])),
        )
        .mount(&mock)
        .await;

    let updated = tester
        .lifecycle_update(
            "hetznerrobot_vswitch",
            state,
            json!({"name": "lan", "vlan": 4000, "servers": [4, 3]}),
        )
        .await
        .unwrap();
    assert_eq!(updated["servers"], json!([3, 4]));
    assert_eq!(updated["incidents"], json!([]));
}

#[tokio::test]
async fn vswitch_destroy_plan_removes_everything() {
    let tester = ProviderTester::new(HetznerRobotProvider::new());
    let prior = json!({
        "id": "12",
        "name": "lan",
        "vlan": 4000,
        "servers": [1, 3],
        "cancellation_date": null,
        "incidents": []
    });

    let plan = tester
        .plan_delete("hetznerrobot_vswitch", prior)
        .await
        .unwrap();
    assert!(plan.planned_state.is_null());
    assert!(!plan.requires_replace);
    assert!(plan.changes.iter().all(|c| c.after.is_none()));
    assert_plan_changes_attribute(&plan, "servers");
    assert!(!plan.changes.iter().any(|c| c.path == "cancellation_date"));
}

#[tokio::test]
async fn vswitch_delete_tolerates_missing() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;
    Mock::given(method("DELETE"))
        .and(path("/vswitch/12"))
        .and(body_string("cancellation_date=now"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"status": 404, "code": "NOT_FOUND", "message": "vSwitch not found"}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    assert_ok!(
        tester
            .delete("hetznerrobot_vswitch", json!({"id": "12", "name": "lan", "vlan": 4000}))
            .await
    );
}

#[tokio::test]
async fn firewall_lifecycle() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;
    mount_server(&mock, 7, "10.0.0.7").await;

    Mock::given(method("POST"))
        .and(path("/firewall/10.0.0.7"))
        .and(body_string_contains("status=active"))
        .and(body_string_contains("rules%5Binput%5D%5B0%5D%5Bdst_port%5D=22"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/firewall/10.0.0.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "firewall": {
                "server_ip": "10.0.0.7",
                "whitelist_hos": true,
                "status": "active",
                "rules": {"input": [
                    {"ip_version": "ipv4", "name": "ssh", "dst_port": "22", "protocol": "tcp", "action": "accept"}
                ]}
            }
        })))
        .mount(&mock)
        .await;

    let config = json!({
        "server_id": "7",
        "active": true,
        "whitelist_hos": true,
        "rule": [{"name": "ssh", "dst_port": "22", "protocol": "tcp", "action": "accept"}]
    });
    assert_ok!(
        tester
            .validate_resource_config("hetznerrobot_firewall", config.clone())
            .await
    );

    let state = tester
        .lifecycle_create("hetznerrobot_firewall", config)
        .await
        .unwrap();
    assert_eq!(state["id"], "7");
    assert_eq!(state["rule"][0]["dst_port"], "22");

    let plan = tester
        .plan_update(
            "hetznerrobot_firewall",
            state.clone(),
            json!({
                "server_id": "8",
                "active": true,
                "whitelist_hos": true,
                "rule": [{"name": "ssh", "dst_port": "22", "protocol": "tcp", "action": "accept"}]
            }),
        )
        .await
        .unwrap();
    assert_plan_replaces(&plan);
}

#[tokio::test]
async fn firewall_rejects_unknown_action() {
    let tester = ProviderTester::new(HetznerRobotProvider::new());
    let err = assert_err!(
        tester
            .validate_resource_config(
                "hetznerrobot_firewall",
                json!({
                    "server_id": "7",
                    "active": true,
                    "whitelist_hos": false,
                    "rule": [{"action": "reject"}]
                }),
            )
            .await
    );
    match err {
        TestError::Diagnostics(diagnostics) => assert_error_contains(&diagnostics, "action"),
        other => panic!("unexpected error {}", other),
    }
}

#[tokio::test]
async fn server_data_source_fans_out() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;
    mount_server(&mock, 2, "10.0.0.2").await;
    mount_server(&mock, 1, "10.0.0.1").await;

    let value = tester
        .read_data_source("hetznerrobot_server", json!({"ids": ["2", "1"]}))
        .await
        .unwrap();
    assert_eq!(value["id"], "servers-2-1");
    let numbers: Vec<i64> = value["servers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(value["servers"][0]["datacenter"], "FSN1-DC14");
}

#[tokio::test]
async fn vswitch_data_source_empty_is_error() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;
    Mock::given(method("GET"))
        .and(path("/vswitch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock)
        .await;

    let err = tester
        .read_data_source("hetznerrobot_vswitch", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn import_vswitch_by_id() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;
    Mock::given(method("GET"))
        .and(path("/vswitch/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vswitch_body(12, &[(5, "ready")])))
        .mount(&mock)
        .await;

    let imported = tester
        .import_resource("hetznerrobot_vswitch", "12")
        .await
        .unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].state["name"], "lan");
    assert_eq!(imported[0].state["servers"], json!([5]));
}

#[tokio::test]
async fn api_errors_map_to_provider_errors() {
    let mock = MockServer::start().await;
    let tester = configured(&mock).await;
    Mock::given(method("GET"))
        .and(path("/vswitch/12"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "code": "UNAUTHORIZED", "message": "Unauthorized"}
        })))
        .mount(&mock)
        .await;

    let err = tester
        .read("hetznerrobot_vswitch", json!({"id": "12", "name": "lan"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::PermissionDenied(_)));
}

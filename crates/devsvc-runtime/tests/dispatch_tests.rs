//! Single-device read and write dispatch

mod common;

use std::sync::atomic::Ordering;

use devsvc_core::{
    AdminState, Direction, OperatingState, Scalar, ServiceError, ValueType,
};
use devsvc_runtime::ServiceSettings;
use pretty_assertions::assert_eq;
use rstest::rstest;

use common::{device, hvac_profile, Harness};

fn values(event: &devsvc_core::Event) -> Vec<(&str, &str)> {
    event
        .readings
        .iter()
        .map(|r| (r.name.as_str(), r.value.as_str()))
        .collect()
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_read_applies_pipeline_and_publishes() {
    let mut h = Harness::with_thermostat().await;

    let outcome = h
        .service
        .dispatch("d1", "climate", Direction::Get, "")
        .await
        .unwrap()
        .expect("read returns an outcome");

    assert_eq!(outcome.failure, None);
    assert_eq!(outcome.event.device, "thermostat");
    assert_eq!(
        values(&outcome.event),
        vec![
            ("temperature", "45"),
            ("status", "1"),
            ("switch", "ON"),
            ("label", "lobby"),
        ]
    );
    assert!(outcome.event.readings.iter().all(|r| r.device == "thermostat"));
    assert_eq!(h.driver.reads(), 1);

    let published = h.next_event().await;
    assert_eq!(published, outcome.event);
}

#[tokio::test]
async fn test_read_unknown_device() {
    let h = Harness::with_thermostat().await;
    let err = h
        .service
        .dispatch("nope", "climate", Direction::Get, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(h.driver.reads(), 0);
}

#[tokio::test]
async fn test_locked_device_rejects_read_and_write() {
    let h = Harness::with_thermostat().await;
    h.service
        .caches()
        .devices
        .update_admin_state("d1", AdminState::Locked)
        .unwrap();

    let read = h.service.dispatch("d1", "temperature", Direction::Get, "").await;
    assert!(matches!(read, Err(ServiceError::Locked(_))));

    let write = h
        .service
        .dispatch("d1", "temperature", Direction::Set, r#"[{"temperature":"1"}]"#)
        .await;
    assert!(matches!(write, Err(ServiceError::Locked(_))));
    assert_eq!(h.driver.reads(), 0);
    assert!(h.driver.writes.lock().is_empty());
}

#[tokio::test]
async fn test_undeclared_and_unknown_commands() {
    let h = Harness::with_thermostat().await;

    // mapped as a resource but missing from the commands list
    let err = h
        .service
        .dispatch("d1", "undeclared", Direction::Get, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = h
        .service
        .dispatch("d1", "reboot", Direction::Get, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(h.driver.reads(), 0);
}

#[tokio::test]
async fn test_max_cmd_ops_exceeded_skips_driver() {
    let h = Harness::new(
        vec![device("d1", "thermostat")],
        ServiceSettings::default().with_max_cmd_ops(2),
    )
    .await;

    let err = h
        .service
        .dispatch("d1", "climate", Direction::Get, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ServerError(ref m) if m.contains("MaxCmdOps")));

    let err = h
        .service
        .dispatch("d1", "climate", Direction::Set, "[]")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ServerError(_)));

    assert_eq!(h.driver.reads(), 0);
    assert!(h.driver.writes.lock().is_empty());

    // within the limit still works
    assert!(h
        .service
        .dispatch("d1", "switch", Direction::Get, "")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_driver_failure_is_server_error() {
    let h = Harness::with_thermostat().await;
    h.driver.fail_for("thermostat");

    let err = h
        .service
        .dispatch("d1", "temperature", Direction::Get, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ServerError(ref m) if m.contains("unreachable")));
}

#[tokio::test]
async fn test_unknown_object_in_driver_result_is_fatal() {
    let mut h = Harness::with_thermostat().await;
    h.driver.extra_objects.lock().push("ghost".into());

    let err = h
        .service
        .dispatch("d1", "temperature", Direction::Get, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ServerError(ref m) if m.contains("ghost")));
    h.assert_no_event().await;
}

#[tokio::test]
async fn test_assertion_mismatch_disables_device_and_keeps_reading() {
    let mut h = Harness::with_thermostat().await;
    h.driver.set("status", Scalar::Int32(0));

    let outcome = h
        .service
        .dispatch("d1", "climate", Direction::Get, "")
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(
        outcome.failure,
        Some(ServiceError::TransformFailure(ref m)) if m.contains("assertion")
    ));
    assert_eq!(outcome.event.readings.len(), 4);
    assert_eq!(outcome.event.readings[1].value, "0");

    let cached = h.service.caches().devices.for_id("d1").unwrap();
    assert_eq!(cached.operating_state, OperatingState::Disabled);

    let (name, state) = h.next_notification().await;
    assert_eq!(name, "thermostat");
    assert_eq!(state, OperatingState::Disabled);

    // the event is still published
    assert_eq!(h.next_event().await.readings.len(), 4);
}

#[tokio::test]
async fn test_malformed_parameter_is_non_fatal() {
    let h = Harness::with_thermostat().await;
    let mut profile = hvac_profile();
    profile.device_resources[0].properties.scale = Some("two".into());
    h.service.update_profile(profile).unwrap();

    let outcome = h
        .service
        .dispatch("d1", "temperature", Direction::Get, "")
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome.failure, Some(ServiceError::TransformFailure(_))));
    // raw value kept
    assert_eq!(values(&outcome.event), vec![("temperature", "20")]);
}

#[tokio::test]
async fn test_data_transform_toggle() {
    let h = Harness::with_thermostat().await;
    h.service.set_data_transform(false);

    let outcome = h
        .service
        .dispatch("d1", "climate", Direction::Get, "")
        .await
        .unwrap()
        .unwrap();
    // transform skipped, mapping still applied
    assert_eq!(
        values(&outcome.event),
        vec![
            ("temperature", "20"),
            ("status", "1"),
            ("switch", "ON"),
            ("label", "lobby"),
        ]
    );

    h.service.set_data_transform(true);
    let outcome = h
        .service
        .dispatch("d1", "temperature", Direction::Get, "")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(values(&outcome.event), vec![("temperature", "45")]);
}

#[tokio::test]
async fn test_unmapped_value_passes_through() {
    let h = Harness::with_thermostat().await;
    h.driver.set("switch", Scalar::Uint8(2));

    let outcome = h
        .service
        .dispatch("d1", "switch", Direction::Get, "")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(values(&outcome.event), vec![("switch", "2")]);
}

#[rstest]
#[case::carried_operation(false)]
#[case::bare_values(true)]
#[tokio::test]
async fn test_repeated_object_uses_each_operation_mapping(#[case] bare: bool) {
    let mut h = Harness::with_thermostat().await;
    h.driver.bare_values.store(bare, Ordering::SeqCst);

    let outcome = h
        .service
        .dispatch("d1", "switches", Direction::Get, "")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(values(&outcome.event), vec![("switch", "ON"), ("switch", "YES")]);
    assert_eq!(h.next_event().await, outcome.event);
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_write_parses_transforms_and_batches() {
    let mut h = Harness::with_thermostat().await;

    let result = h
        .service
        .dispatch(
            "d1",
            "climate",
            Direction::Set,
            r#"[{"temperature":"45"},{"bogus":"1"},{"setpoint":"3"},{"label":"hall"}]"#,
        )
        .await
        .unwrap();
    assert!(result.is_none());

    let writes = h.driver.writes.lock().clone();
    assert_eq!(writes.len(), 1);
    let call = &writes[0];
    assert_eq!(call.device, "thermostat");

    let objects: Vec<_> = call.requests.iter().map(|r| r.ro.object.as_str()).collect();
    assert_eq!(objects, vec!["temperature", "setpoint", "label"]);
    assert_eq!(call.values[0].scalar().unwrap(), Scalar::Int32(20));
    assert_eq!(call.values[1].scalar().unwrap(), Scalar::Float32(6.0));
    assert_eq!(call.values[2].value_to_string().unwrap(), "hall");
    let carried: Vec<_> = call
        .values
        .iter()
        .map(|v| v.operation.as_ref().map(|ro| ro.object.as_str()))
        .collect();
    assert_eq!(carried, vec![Some("temperature"), Some("setpoint"), Some("label")]);

    // writes produce no event
    h.assert_no_event().await;
}

#[tokio::test]
async fn test_write_mapping_replaces_sent_value() {
    let h = Harness::with_thermostat().await;
    h.service
        .dispatch("d1", "switch", Direction::Set, r#"[{"switch":"0"}]"#)
        .await
        .unwrap();

    let writes = h.driver.writes.lock().clone();
    let value = &writes[0].values[0];
    assert_eq!(value.value_type, ValueType::String);
    assert_eq!(value.value_to_string().unwrap(), "OFF");
}

#[rstest]
#[case::not_an_array(r#"{"temperature":"1"}"#)]
#[case::not_json("not json")]
#[case::not_a_number(r#"[{"temperature":"warm"}]"#)]
#[case::out_of_range(r#"[{"temperature":"99999999999"}]"#)]
#[case::value_not_a_string(r#"[{"temperature":1}]"#)]
#[tokio::test]
async fn test_write_bad_requests(#[case] body: &str) {
    let h = Harness::with_thermostat().await;

    let err = h
        .service
        .dispatch("d1", "temperature", Direction::Set, body)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)), "{err:?}");
    assert!(h.driver.writes.lock().is_empty());
}

#[tokio::test]
async fn test_write_without_set_operations_is_not_found() {
    let h = Harness::with_thermostat().await;

    for command in ["status", "switches"] {
        let body = format!(r#"[{{"{command}":"1"}}]"#);
        let err = h
            .service
            .dispatch("d1", command, Direction::Set, &body)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "{command}: {err:?}");
    }
    assert!(h.driver.writes.lock().is_empty());
}

#[tokio::test]
async fn test_write_missing_value_descriptor() {
    let h = Harness::with_thermostat().await;
    h.service
        .caches()
        .value_descriptors
        .remove_by_name("label")
        .unwrap();

    let err = h
        .service
        .dispatch("d1", "climate", Direction::Set, r#"[{"label":"hall"}]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(ref m) if m.contains("Value Descriptor")));
}

#[tokio::test]
async fn test_write_zero_scale_is_server_error() {
    let h = Harness::with_thermostat().await;
    let mut profile = hvac_profile();
    profile.device_resources[3].properties.scale = Some("0".into());
    h.service.update_profile(profile).unwrap();

    let err = h
        .service
        .dispatch("d1", "climate", Direction::Set, r#"[{"setpoint":"3"}]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ServerError(ref m) if m.contains("scale is 0")));
    assert!(h.driver.writes.lock().is_empty());
}

#[tokio::test]
async fn test_write_driver_failure() {
    let h = Harness::with_thermostat().await;
    h.driver.fail_for("thermostat");

    let err = h
        .service
        .dispatch("d1", "temperature", Direction::Set, r#"[{"temperature":"7"}]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ServerError(_)));
}

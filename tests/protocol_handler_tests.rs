use venus_virtual::protocol::*;
use venus_virtual::*;

#[test]
fn test_request_parsing_simple() {
    let mut handler = ProtocolHandler::new();

    let request = handler.parse_request(r#"{"id":123,"request_type":"Ping"}"#).unwrap();
    assert_eq!(request.id, 123);
    assert!(matches!(request.request_type, RequestType::Ping));

    let request = handler
        .parse_request(r#"{"id":7,"request_type":{"CloseDevice":{"device":"meter1"}}}"#)
        .unwrap();
    assert_eq!(
        request.request_type,
        RequestType::CloseDevice { device: "meter1".into() }
    );
}

#[test]
fn test_request_parsing_values() {
    let mut handler = ProtocolHandler::new();

    let request = handler
        .parse_request(r#"{"id":1,"request_type":{"SetValue":{"device":"t","path":"Temperature","value":19}}}"#)
        .unwrap();
    if let RequestType::SetValue { value, .. } = request.request_type {
        assert_eq!(value, Value::Int(19));
    } else {
        panic!("Expected SetValue request type");
    }

    let request = handler
        .parse_request(r#"{"id":2,"request_type":{"Publish":{"device":"t","path":"CustomName","value":"Shed"}}}"#)
        .unwrap();
    if let RequestType::Publish { value, .. } = request.request_type {
        assert_eq!(value, Value::Text("Shed".into()));
    } else {
        panic!("Expected Publish request type");
    }
}

#[test]
fn test_request_parsing_device_config() {
    let mut handler = ProtocolHandler::new();

    let json = r#"{"id":5,"request_type":{"CreateDevice":{"config":{"id":"g","device":"grid","device_instance":40,"name":"Mains","nr_of_phases":3}}}}"#;
    let request = handler.parse_request(json).unwrap();
    let RequestType::CreateDevice { config } = request.request_type else {
        panic!("Expected CreateDevice request type");
    };
    assert_eq!(config.device, DeviceKind::Grid);
    assert_eq!(config.device_instance(), 40);
    assert_eq!(config.name.as_deref(), Some("Mains"));

    // Unknown kinds parse and are handled at export time
    let json = r#"{"id":6,"request_type":{"CreateDevice":{"config":{"id":"x","device":"toaster"}}}}"#;
    let request = handler.parse_request(json).unwrap();
    let RequestType::CreateDevice { config } = request.request_type else {
        panic!("Expected CreateDevice request type");
    };
    assert_eq!(config.device, DeviceKind::Other("toaster".into()));
}

#[test]
fn test_request_parsing_invalid() {
    let mut handler = ProtocolHandler::new();

    assert_eq!(handler.parse_request("{not json"), Err(ProtocolError::InvalidJson));
    assert_eq!(
        handler.parse_request(r#"{"id":1,"request_type":"Reboot"}"#),
        Err(ProtocolError::InvalidJson)
    );
    // Unknown config fields are rejected
    assert_eq!(
        handler.parse_request(
            r#"{"id":1,"request_type":{"CreateDevice":{"config":{"id":"x","device":"grid","phases":3}}}}"#
        ),
        Err(ProtocolError::InvalidJson)
    );
}

#[test]
fn test_request_too_large() {
    let mut handler = ProtocolHandler::new();
    let name = "n".repeat(MAX_REQUEST_SIZE);
    let json = format!(
        r#"{{"id":1,"request_type":{{"Describe":{{"device":"{}"}}}}}}"#,
        name
    );
    assert_eq!(handler.parse_request(&json), Err(ProtocolError::MessageTooLarge));

    // The handler stays usable afterwards
    assert!(handler.parse_request(r#"{"id":2,"request_type":"ListDevices"}"#).is_ok());
}

#[test]
fn test_request_serialization() {
    let mut handler = ProtocolHandler::new();
    let request = Request {
        id: handler.next_request_id(),
        request_type: RequestType::GetText {
            device: "m".into(),
            path: "Ac/L1/Power".into(),
        },
    };

    let json = handler.serialize_request(&request).unwrap();
    assert_eq!(
        json,
        r#"{"id":1,"request_type":{"GetText":{"device":"m","path":"Ac/L1/Power"}}}"#
    );
    assert_eq!(handler.parse_request(&json).unwrap(), request);
}

#[test]
fn test_response_creation() {
    let handler = ProtocolHandler::new();

    let ok = handler.create_response(4, ResponseStatus::Success, None, Some(serde_json::json!("pong")));
    assert!(ok.is_success());
    let json = handler.serialize_response(&ok).unwrap();
    assert_eq!(json, r#"{"id":4,"status":"Success","message":null,"payload":"pong"}"#);

    let error = handler.create_error_response(5, ResponseStatus::NotFound, "device x not found");
    assert!(!error.is_success());
    let json = handler.serialize_response(&error).unwrap();
    assert!(!json.contains("payload"));
    assert_eq!(handler.parse_response(&json).unwrap(), error);
}

#[test]
fn test_request_ids_increase() {
    let mut handler = ProtocolHandler::new();
    let first = handler.next_request_id();
    let second = handler.next_request_id();
    assert_eq!(second, first + 1);
}

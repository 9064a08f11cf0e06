//! Handler behaviour through the dispatcher: replies, batch shaping, and
//! reply-stream completion on every exit path.

use hybrid_core::{Auth, Credentials, Id, ItemResult, PlmError, TypeId, BaseType, Type};
use hybrid_proto::custom::{self, auth_result, item_result};
use hybrid_proto::methods::{
    RETURN_ADVANCE_STATE, RETURN_CREATE_ITEMS, RETURN_DELETE_ITEMS,
    RETURN_IS_OPERATION_SUPPORTED, RETURN_QUERY_ITEMS, RETURN_READ_ITEMS,
    RETURN_READ_RELATIONSHIPS, RETURN_READ_TYPES, RETURN_READ_TYPE_IDENTIFIERS,
    RETURN_TEST_ACCESS, RETURN_UPDATE_ITEMS, RETURN_UPLOAD_FILE,
};
use hybrid_proto::{Envelope, Request};
use hybrid_test_utils::{fixtures, PlmCall, ScriptedPlm};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tonic::Status;

#[path = "support/hub.rs"]
mod hub;
#[path = "support/harness.rs"]
mod harness;

use harness::{dispatch, test_dispatcher};
use hub::MockHub;

fn setup(plm: ScriptedPlm) -> (Arc<MockHub>, Arc<ScriptedPlm>) {
    (Arc::new(MockHub::default()), Arc::new(plm))
}

// ============================================================================
// UNARY REPLIES
// ============================================================================

#[tokio::test]
async fn test_access_granted_replies_success() {
    let (hub, plm) = setup(ScriptedPlm::new());
    let (dispatcher, _) = test_dispatcher(hub.clone(), plm.clone());

    dispatch(&dispatcher, fixtures::test_access_request("abc", "u", "p")).await;

    let expected = Auth {
        credentials: Some(Credentials {
            username: "u".to_string(),
            password: "p".to_string(),
        }),
        ..Default::default()
    };
    assert_eq!(plm.calls(), vec![PlmCall::TestAccess(expected)]);

    let replies = hub.sent_on(RETURN_TEST_ACCESS);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].correlation_id(), "abc");
    let result = replies[0].value().unwrap();
    assert!(result.success);
    assert_eq!(result.status, auth_result::Status::Success as i32);
    assert_eq!(hub.sent()[0].correlation_id, "abc");
}

#[tokio::test]
async fn test_access_denied_replies_invalid_credentials() {
    let (hub, plm) = setup(ScriptedPlm::new().deny_access());
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::test_access_request("abc", "u", "wrong")).await;

    let replies = hub.sent_on(RETURN_TEST_ACCESS);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].correlation_id(), "abc");
    let result = replies[0].value().unwrap();
    assert!(!result.success);
    assert_eq!(result.status, auth_result::Status::InvalidCredentials as i32);
    assert_eq!(metrics.snapshot().dispatch_failures, 0);
}

#[tokio::test]
async fn test_unary_operations_reply_once() {
    let (hub, plm) = setup(ScriptedPlm::new().supporting_operations().with_upload_id("F-42"));
    let (dispatcher, _) = test_dispatcher(hub.clone(), plm.clone());

    let requests = vec![
        Request {
            correlation_id: "advance".to_string(),
            advance_state: Some(custom::AdvanceStateRequest {
                id: Some(fixtures::wire_id("PRT-1")),
            }),
            ..Default::default()
        },
        Request {
            correlation_id: "supported".to_string(),
            is_operation_supported: Some(custom::OperationSupportedRequest {
                operation: custom::SupportedOperation::CreateMfrParts as i32,
            }),
            ..Default::default()
        },
        Request {
            correlation_id: "delete".to_string(),
            delete_items: Some(custom::IdRequest {
                data: vec![fixtures::wire_id("PRT-1"), fixtures::wire_id("PRT-2")],
            }),
            ..Default::default()
        },
        Request {
            correlation_id: "upload".to_string(),
            upload_file: Some(custom::FileResource {
                file_name: "drawing.pdf".to_string(),
                data: vec![1, 2, 3],
            }),
            ..Default::default()
        },
    ];
    for request in requests {
        dispatch(&dispatcher, request).await;
    }

    let advanced = hub.sent_on(RETURN_ADVANCE_STATE);
    assert_eq!(advanced.len(), 1);
    assert_eq!(advanced[0].correlation_id(), "advance");

    let supported = hub.sent_on(RETURN_IS_OPERATION_SUPPORTED);
    assert_eq!(supported.len(), 1);
    assert!(supported[0].value().unwrap().is_supported);

    let deleted = hub.sent_on(RETURN_DELETE_ITEMS);
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].correlation_id(), "delete");

    let uploaded = hub.sent_on(RETURN_UPLOAD_FILE);
    assert_eq!(uploaded[0].value().unwrap().id, "F-42");

    let calls = plm.calls();
    assert_eq!(calls[0], PlmCall::AdvanceState(Id::new("PRT-1")));
    assert_eq!(
        calls[1],
        PlmCall::IsOperationSupported(hybrid_core::SupportedOperation::CreateMfrParts)
    );
    assert_eq!(
        calls[2],
        PlmCall::DeleteItems(vec![Id::new("PRT-1"), Id::new("PRT-2")])
    );
    assert!(hub.streams().is_empty());
}

#[tokio::test]
async fn test_unary_service_failure_sends_nothing() {
    let (hub, plm) = setup(ScriptedPlm::new().failing("advance_state", PlmError::backend("locked")));
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm);

    dispatch(
        &dispatcher,
        Request {
            correlation_id: "adv".to_string(),
            advance_state: Some(custom::AdvanceStateRequest::default()),
            ..Default::default()
        },
    )
    .await;

    assert!(hub.sent().is_empty());
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.dispatched, 1);
    assert_eq!(snapshot.dispatch_failures, 1);
}

#[tokio::test]
async fn test_hub_send_failure_is_contained() {
    let hub = Arc::new(MockHub::default().failing_sends(Status::unavailable("hub down")));
    let plm = Arc::new(ScriptedPlm::new());
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::test_access_request("abc", "u", "p")).await;

    assert_eq!(metrics.snapshot().dispatch_failures, 1);
}

// ============================================================================
// BATCH REPLIES
// ============================================================================

#[tokio::test]
async fn test_create_items_streams_one_result_per_spec_in_order() {
    let (hub, plm) = setup(ScriptedPlm::new().with_item_results(vec![
        fixtures::ok_result("A"),
        ItemResult::error("dup"),
        fixtures::ok_result("C"),
    ]));
    let (dispatcher, _) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::create_items_request("xyz", &["a", "b", "c"])).await;

    let (messages, completions) = hub.stream_on(RETURN_CREATE_ITEMS);
    assert_eq!(completions, 1);
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.correlation_id() == "xyz"));

    match messages[0].value().unwrap().outcome.as_ref() {
        Some(item_result::Outcome::Item(item)) => {
            assert_eq!(item.id.as_ref().unwrap().public_id, "A")
        }
        other => panic!("expected item, got {other:?}"),
    }
    match messages[1].value().unwrap().outcome.as_ref() {
        Some(item_result::Outcome::Error(error)) => assert_eq!(error.message, "dup"),
        other => panic!("expected error, got {other:?}"),
    }
    assert!(matches!(
        messages[2].value().unwrap().outcome,
        Some(item_result::Outcome::Item(_))
    ));
}

#[tokio::test]
async fn test_create_items_pads_missing_results() {
    let (hub, plm) = setup(ScriptedPlm::new().with_item_results(vec![fixtures::ok_result("A")]));
    let (dispatcher, _) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::create_items_request("pad", &["a", "b", "c"])).await;

    let (messages, completions) = hub.stream_on(RETURN_CREATE_ITEMS);
    assert_eq!(completions, 1);
    assert_eq!(messages.len(), 3);
    for message in &messages[1..] {
        assert!(matches!(
            message.value().unwrap().outcome,
            Some(item_result::Outcome::Error(_))
        ));
    }
}

#[tokio::test]
async fn test_create_items_failure_replies_single_error() {
    let (hub, plm) = setup(ScriptedPlm::new().failing("create_items", PlmError::backend("db offline")));
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::create_items_request("err", &["a", "b"])).await;

    let (messages, completions) = hub.stream_on(RETURN_CREATE_ITEMS);
    assert_eq!(completions, 1);
    assert_eq!(messages.len(), 1);
    match messages[0].value().unwrap().outcome.as_ref() {
        Some(item_result::Outcome::Error(error)) => {
            assert_eq!(error.message, "PLM backend failure: db offline")
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(metrics.snapshot().dispatch_failures, 0);
}

#[tokio::test]
async fn test_update_items_echoes_each_spec() {
    let (hub, plm) = setup(ScriptedPlm::new());
    let (dispatcher, _) = test_dispatcher(hub.clone(), plm);

    let request = Request {
        correlation_id: "upd".to_string(),
        update_items: Some(custom::ItemUpdateRequest {
            data: vec![
                custom::ItemUpdateSpec {
                    id: Some(fixtures::wire_id("PRT-1")),
                    ..Default::default()
                },
                custom::ItemUpdateSpec {
                    id: Some(fixtures::wire_id("PRT-2")),
                    ..Default::default()
                },
            ],
        }),
        ..Default::default()
    };
    dispatch(&dispatcher, request).await;

    let (messages, completions) = hub.stream_on(RETURN_UPDATE_ITEMS);
    assert_eq!(completions, 1);
    let ids: Vec<_> = messages
        .iter()
        .map(|m| match m.value().unwrap().outcome.as_ref() {
            Some(item_result::Outcome::Item(item)) => item.id.as_ref().unwrap().public_id.clone(),
            other => panic!("expected item, got {other:?}"),
        })
        .collect();
    assert_eq!(ids, vec!["PRT-1", "PRT-2"]);
}

// ============================================================================
// STREAMED READS
// ============================================================================

#[tokio::test]
async fn test_streamed_reads_write_one_message_per_element() {
    let (hub, plm) = setup(
        ScriptedPlm::new()
            .with_items(vec![fixtures::item("PRT-1"), fixtures::item("PRT-2")])
            .with_query_ids(vec![Id::new("PRT-7")])
            .with_relationships(vec![Default::default()])
            .with_types(vec![Type {
                id: TypeId::new("part", BaseType::Item),
                ..Default::default()
            }])
            .with_type_ids(vec![
                TypeId::new("part", BaseType::Item),
                TypeId::new("eco", BaseType::Change),
            ]),
    );
    let (dispatcher, _) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::read_items_request("read", &["PRT-1", "PRT-2"])).await;
    dispatch(
        &dispatcher,
        Request {
            correlation_id: "query".to_string(),
            query_items: Some(custom::QueryItemsRequest::default()),
            ..Default::default()
        },
    )
    .await;
    dispatch(
        &dispatcher,
        Request {
            correlation_id: "rel".to_string(),
            read_relationships: Some(custom::RelationshipRequest {
                ids: vec![fixtures::wire_id("PRT-1")],
                r#type: custom::RelationshipType::Bom as i32,
            }),
            ..Default::default()
        },
    )
    .await;
    dispatch(
        &dispatcher,
        Request {
            correlation_id: "types".to_string(),
            read_types: Some(custom::TypeIdRequest::default()),
            ..Default::default()
        },
    )
    .await;
    dispatch(
        &dispatcher,
        Request {
            correlation_id: "type-ids".to_string(),
            read_type_identifiers: Some(custom::TypeRequest::default()),
            ..Default::default()
        },
    )
    .await;

    let (items, done) = hub.stream_on(RETURN_READ_ITEMS);
    assert_eq!((items.len(), done), (2, 1));
    assert!(items.iter().all(|m| m.correlation_id() == "read"));

    let (ids, done) = hub.stream_on(RETURN_QUERY_ITEMS);
    assert_eq!((ids.len(), done), (1, 1));
    assert_eq!(ids[0].value().unwrap().public_id, "PRT-7");

    let (tables, done) = hub.stream_on(RETURN_READ_RELATIONSHIPS);
    assert_eq!((tables.len(), done), (1, 1));

    let (types, done) = hub.stream_on(RETURN_READ_TYPES);
    assert_eq!((types.len(), done), (1, 1));

    let (type_ids, done) = hub.stream_on(RETURN_READ_TYPE_IDENTIFIERS);
    assert_eq!((type_ids.len(), done), (2, 1));
    assert_eq!(type_ids[1].value().unwrap().id, "eco");
}

#[tokio::test]
async fn test_streamed_read_failure_still_completes_stream() {
    let (hub, plm) = setup(ScriptedPlm::new().failing("read_items", PlmError::not_found("PRT-9")));
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm);

    dispatch(&dispatcher, fixtures::read_items_request("missing", &["PRT-9"])).await;

    let (messages, completions) = hub.stream_on(RETURN_READ_ITEMS);
    assert!(messages.is_empty());
    assert_eq!(completions, 1);
    assert_eq!(metrics.snapshot().dispatch_failures, 1);
}

#[tokio::test]
async fn test_handler_panic_is_contained_and_stream_completed() {
    let (hub, plm) = setup(ScriptedPlm::new().panicking("query_items"));
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm);

    dispatch(
        &dispatcher,
        Request {
            correlation_id: "boom".to_string(),
            query_items: Some(custom::QueryItemsRequest::default()),
            ..Default::default()
        },
    )
    .await;

    hub.wait_for_completed_streams(1).await;
    let (messages, completions) = hub.stream_on(RETURN_QUERY_ITEMS);
    assert!(messages.is_empty());
    assert_eq!(completions, 1);
    assert_eq!(metrics.snapshot().handler_panics, 1);
}

#[tokio::test]
async fn test_cancelled_request_completes_stream_without_failure() {
    let (hub, plm) = setup(ScriptedPlm::new().with_delay(Duration::from_secs(60)));
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm.clone());
    let unit = hybrid_agent::route(fixtures::read_items_request("slow", &["PRT-1"])).unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    let waiter = plm.clone();
    tokio::spawn(async move {
        waiter.wait_for_calls(1).await;
        canceller.cancel();
    });
    dispatcher.publish(unit, &token).await;

    timeout(Duration::from_secs(5), hub.wait_for_completed_streams(1))
        .await
        .expect("the reply stream should still be closed");
    let (messages, completions) = hub.stream_on(RETURN_READ_ITEMS);
    assert!(messages.is_empty());
    assert_eq!(completions, 1);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.dispatch_failures, 0);
    assert_eq!(snapshot.handler_panics, 0);
}

#[tokio::test]
async fn test_cancellation_abandons_unanswered_unary_reply() {
    let hub = Arc::new(MockHub::default().hanging_sends());
    let plm = Arc::new(ScriptedPlm::new());
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm.clone());
    let unit = hybrid_agent::route(fixtures::test_access_request("stuck", "u", "p")).unwrap();

    let token = CancellationToken::new();
    let publish = tokio::spawn({
        let token = token.clone();
        async move { dispatcher.publish(unit, &token).await }
    });
    timeout(Duration::from_secs(5), hub.wait_for_send_attempts(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    timeout(Duration::from_secs(1), publish)
        .await
        .expect("publish should return once cancelled")
        .unwrap();
    assert!(hub.sent().is_empty());
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.dispatch_failures, 0);
    assert_eq!(snapshot.handler_panics, 0);
}

#[tokio::test]
async fn test_cancellation_abandons_unacknowledged_reply_stream() {
    let hub = Arc::new(MockHub::default().hanging_stream_acks());
    let plm = Arc::new(ScriptedPlm::new());
    let (dispatcher, metrics) = test_dispatcher(hub.clone(), plm.clone());
    let unit = hybrid_agent::route(fixtures::read_items_request("unacked", &["PRT-1"])).unwrap();

    let token = CancellationToken::new();
    let publish = tokio::spawn({
        let token = token.clone();
        async move { dispatcher.publish(unit, &token).await }
    });
    timeout(Duration::from_secs(5), hub.wait_for_completed_streams(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!publish.is_finished());
    token.cancel();

    timeout(Duration::from_secs(1), publish)
        .await
        .expect("publish should return once cancelled")
        .unwrap();
    let (_, completions) = hub.stream_on(RETURN_READ_ITEMS);
    assert_eq!(completions, 1);
    assert_eq!(metrics.snapshot().dispatch_failures, 0);
}

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tessel_model::DataModel;
use tessel_schema::{Schema, Structure, TypeDescriptor};
use tessel_sync::channel::{self, MessageChannel};
use tessel_sync::{
    ActionHandler, ActionRequest, DataModelServer, Message, SetField, SetFieldAction, SyncError,
};
use tessel_types::{EntityId, RefToken};

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .kind(
                "Cell",
                Structure::new()
                    .string("nom")
                    .boolean("state")
                    .reference("p", ["Point"]),
            )
            .kind(
                "Groupe",
                Structure::new().boolean("state").field(
                    "membres",
                    TypeDescriptor::array_of(TypeDescriptor::reference(["Cell"])),
                ),
            )
            .kind("Point", Structure::new().number("x").number("y"))
            .build(),
    )
}

/// Server over a point, one cell and a group. Returns the cell and group tokens.
fn make_server() -> (DataModelServer, RefToken, RefToken) {
    let mut model = DataModel::new(schema());
    let pt = model.create_value("Point", json!({"x": 45, "y": 7}));
    let cell = model.create_value(
        "Cell",
        json!({"nom": "A", "state": false, "p": pt.to_value()}),
    );
    let groupe = model.create_value(
        "Groupe",
        json!({"membres": [cell.to_value()], "state": false}),
    );
    (DataModelServer::new(model), cell, groupe)
}

fn set_field(target: &RefToken, field: &str, value: Value) -> Message {
    let arg = SetField::new(target.clone(), field, value);
    Message::action("setField", serde_json::to_value(arg).unwrap())
}

fn refuse_all(_: &mut DataModel, _: &ActionRequest, _: &RefToken) -> bool {
    true
}

// ── handle_message ───────────────────────────────────────────────

#[test]
fn get_observation_replies_with_snapshot() {
    let (mut server, ..) = make_server();
    let self_ref = RefToken::new("$2");
    let reply = server.handle_message(Message::GetObservation, &SetFieldAction, &self_ref);
    assert_eq!(
        reply,
        Some(Message::snapshot(server.model().snapshot(), false))
    );
}

#[test]
fn get_self_replies_with_configured_id() {
    let (mut server, _, groupe) = make_server();
    let reply = server.handle_message(Message::GetSelf, &SetFieldAction, &groupe);
    assert_eq!(
        reply,
        Some(Message::RefResponse {
            id: EntityId::new("$2")
        })
    );
}

#[test]
fn do_action_applies_and_replies_with_fresh_snapshot() {
    let (mut server, cell, groupe) = make_server();
    let reply = server
        .handle_message(set_field(&cell, "state", json!(true)), &SetFieldAction, &groupe)
        .unwrap();

    let Message::DataModelResponse { value, error } = reply else {
        panic!("expected a snapshot");
    };
    assert!(!error);
    assert_eq!(value.get(cell.id.as_str()).unwrap()["state"], json!(true));
    assert_eq!(
        server.model().view(cell.id.as_str()).unwrap().get_bool("/state"),
        Some(true)
    );
}

#[test]
fn refused_action_sets_error_and_keeps_state() {
    let (mut server, cell, groupe) = make_server();
    let before = server.model().to_json();

    let reply = server
        .handle_message(set_field(&cell, "state", json!("yes")), &SetFieldAction, &groupe)
        .unwrap();
    assert_eq!(reply, Message::snapshot(server.model().snapshot(), true));
    assert_eq!(server.model().to_json(), before);
}

#[test]
fn unknown_op_is_refused_by_set_field_action() {
    let (mut server, _, groupe) = make_server();
    let reply = server
        .handle_message(Message::action("explode", json!({})), &SetFieldAction, &groupe)
        .unwrap();
    assert!(matches!(reply, Message::DataModelResponse { error: true, .. }));
}

#[test]
fn malformed_set_field_argument_is_refused() {
    let (mut server, _, groupe) = make_server();
    let reply = server
        .handle_message(
            Message::action("setField", json!({"field": "state"})),
            &SetFieldAction,
            &groupe,
        )
        .unwrap();
    assert!(matches!(reply, Message::DataModelResponse { error: true, .. }));
}

#[test]
fn closure_handlers_see_request_and_self_ref() {
    let (mut server, cell, groupe) = make_server();
    let calls = AtomicUsize::new(0);
    let handler = |model: &mut DataModel, req: &ActionRequest, me: &RefToken| {
        calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(req.op, "promote");
        // Only the group may flip its own state.
        !model.set_field(me.id.as_str(), "state", req.value.clone())
    };

    let reply = server
        .handle_message(Message::action("promote", json!(true)), &handler, &groupe)
        .unwrap();
    assert!(matches!(reply, Message::DataModelResponse { error: false, .. }));
    assert!(server.model().view(groupe.id.as_str()).unwrap().get_bool("/state").unwrap());
    assert!(!server.model().view(cell.id.as_str()).unwrap().get_bool("/state").unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn plain_fn_handlers_work() {
    let (mut server, _, groupe) = make_server();
    let reply = server
        .handle_message(Message::action("anything", json!(1)), &refuse_all, &groupe)
        .unwrap();
    assert!(matches!(reply, Message::DataModelResponse { error: true, .. }));
}

#[test]
fn boxed_handlers_work() {
    let (mut server, cell, groupe) = make_server();
    let handler: Box<dyn ActionHandler> = Box::new(SetFieldAction);
    let reply = server
        .handle_message(set_field(&cell, "nom", json!("B")), handler.as_ref(), &groupe)
        .unwrap();
    assert!(matches!(reply, Message::DataModelResponse { error: false, .. }));
}

#[test]
fn replies_sent_to_the_server_are_ignored() {
    let (mut server, _, groupe) = make_server();
    let before = server.model().to_json();
    assert_eq!(
        server.handle_message(
            Message::snapshot(Default::default(), false),
            &SetFieldAction,
            &groupe
        ),
        None
    );
    assert_eq!(
        server.handle_message(Message::self_ref(&groupe), &SetFieldAction, &groupe),
        None
    );
    assert_eq!(server.model().to_json(), before);
}

// ── process ──────────────────────────────────────────────────────

#[tokio::test]
async fn process_answers_in_arrival_order_until_close() {
    let (mut server, cell, groupe) = make_server();
    let (server_end, mut remote) = channel::duplex(8);

    remote.send(Message::GetSelf).await.unwrap();
    remote.send(set_field(&cell, "state", json!(true))).await.unwrap();
    remote.send(Message::GetObservation).await.unwrap();
    remote.send(Message::self_ref(&cell)).await.unwrap();

    let collect = tokio::spawn(async move {
        let mut replies = Vec::new();
        while replies.len() < 3 {
            match remote.recv().await {
                Some(msg) => replies.push(msg),
                None => break,
            }
        }
        replies
    });

    // The remote end stays open inside `collect` until three replies arrive,
    // then drops; `process` returns once the queue is drained.
    let handled = server.process(server_end, &SetFieldAction, &groupe).await.unwrap();
    assert_eq!(handled, 4);

    let replies = collect.await.unwrap();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0], Message::self_ref(&groupe));
    assert!(matches!(replies[1], Message::DataModelResponse { error: false, .. }));
    assert_eq!(replies[2], Message::snapshot(server.model().snapshot(), false));
}

#[tokio::test]
async fn process_returns_when_remote_never_speaks() {
    let (mut server, _, groupe) = make_server();
    let (server_end, remote) = channel::duplex(1);
    drop(remote);
    let handled = server.process(server_end, &SetFieldAction, &groupe).await.unwrap();
    assert_eq!(handled, 0);
}

#[tokio::test]
async fn process_fails_when_reply_cannot_be_delivered() {
    let (mut server, _, groupe) = make_server();
    let (server_end, remote) = channel::duplex(1);
    remote.send(Message::GetObservation).await.unwrap();
    drop(remote);
    let err = server
        .process(server_end, &SetFieldAction, &groupe)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::ChannelClosed));
}

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, RwLock,
};

use penne_client::{
    CallbackError, CallbackRegistry, ClientHandle, DelegateRegistry, DelegateType, DispatchError,
    DispatchOutcome, Dispatcher, DocumentDelegate, RemoteMethodError, StateStore,
};
use penne_shared::{decode, Identifier, IdentifierTable, InvokeId, Message, Specifier, Value};
use penne_test::{frames, TestClient};

type Replies = Arc<Mutex<Vec<Result<Value, RemoteMethodError>>>>;

fn standalone_dispatcher() -> (Dispatcher, RwLock<StateStore>, CallbackRegistry) {
    let document = DocumentDelegate::construct(
        ClientHandle::detached(),
        &Message::empty(Specifier::Document),
        Specifier::Document,
    );
    (
        Dispatcher::new(IdentifierTable::standard(), DelegateRegistry::with_defaults(), false),
        RwLock::new(StateStore::new(Box::new(document))),
        CallbackRegistry::new(),
    )
}

#[test]
fn reply_completes_the_registered_callback_once() {
    let (dispatcher, state, callbacks) = standalone_dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(None));
    {
        let calls = calls.clone();
        let received = received.clone();
        callbacks
            .register(
                InvokeId::from(7u64),
                Box::new(move |result| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    *received.lock().unwrap() = Some(result);
                }),
            )
            .unwrap();
    }

    let reply = decode(&frames::method_reply("7", frames::text("X"))).unwrap();
    let outcome = dispatcher
        .dispatch(reply, &state, &callbacks, &ClientHandle::detached())
        .unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Replied {
            invoke_id: InvokeId::from("7"),
            exception: false,
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*received.lock().unwrap(), Some(Ok(frames::text("X"))));
    assert!(callbacks.is_empty());

    let second = decode(&frames::method_reply("7", frames::text("X"))).unwrap();
    let result = dispatcher.dispatch(second, &state, &callbacks, &ClientHandle::detached());

    assert!(result.is_err());
    match result {
        Err(DispatchError::Callback(CallbackError::UnmatchedInvocation { invoke_id })) => {
            assert_eq!(invoke_id, InvokeId::from("7"));
        }
        _ => panic!("Expected UnmatchedInvocation error"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn integer_invoke_ids_match_text_registrations() {
    let (dispatcher, state, callbacks) = standalone_dispatcher();
    let hit = Arc::new(AtomicUsize::new(0));
    let counter = hit.clone();
    callbacks
        .register(
            InvokeId::from("12"),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    let reply = decode(&frames::frame(
        frames::message_ids::METHOD_REPLY,
        vec![("invoke_id", frames::int(12))],
    ))
    .unwrap();
    dispatcher
        .dispatch(reply, &state, &callbacks, &ClientHandle::detached())
        .unwrap();

    assert_eq!(hit.load(Ordering::SeqCst), 1);
}

#[test]
fn invoke_then_reply_through_the_client() {
    let mut test = TestClient::new();
    let replies = Replies::default();
    let sink = replies.clone();

    let invoke_id = test
        .client()
        .invoke_method(Identifier::new(0, 0), vec![frames::int(2)], None, move |result| {
            sink.lock().unwrap().push(result)
        })
        .unwrap();
    assert_eq!(test.client().pending_invocations(), 1);
    assert_eq!(test.sent().len(), 1);

    test.feed_ok(&frames::method_reply(invoke_id.as_str(), frames::int(4)));

    assert_eq!(*replies.lock().unwrap(), vec![Ok(frames::int(4))]);
    assert_eq!(test.client().pending_invocations(), 0);
}

#[test]
fn missing_result_is_delivered_as_null() {
    let test = TestClient::new();
    let replies = Replies::default();
    let sink = replies.clone();
    let invoke_id = test
        .client()
        .invoke_method(Identifier::new(0, 0), Vec::new(), None, move |result| {
            sink.lock().unwrap().push(result)
        })
        .unwrap();

    test.feed_ok(&frames::frame(
        frames::message_ids::METHOD_REPLY,
        vec![("invoke_id", frames::text(invoke_id.as_str()))],
    ));

    assert_eq!(*replies.lock().unwrap(), vec![Ok(Value::Null)]);
}

#[test]
fn method_exception_is_delivered_to_the_caller() {
    let test = TestClient::new();
    let replies = Replies::default();
    let sink = replies.clone();
    let invoke_id = test
        .client()
        .invoke_method(Identifier::new(1, 0), Vec::new(), None, move |result| {
            sink.lock().unwrap().push(result)
        })
        .unwrap();

    let outcome = test.feed_ok(&frames::method_exception(invoke_id.as_str(), -32601, "Method not found"));

    assert!(matches!(outcome, DispatchOutcome::Replied { exception: true, .. }));
    let replies = replies.lock().unwrap();
    assert_eq!(replies.len(), 1);
    match &replies[0] {
        Err(error) => {
            assert_eq!(error.invoke_id, invoke_id);
            assert_eq!(error.code(), Some(-32601));
            assert_eq!(error.message(), Some("Method not found"));
        }
        Ok(value) => panic!("Expected RemoteMethodError, got {:?}", value),
    }
}

#[test]
fn unclaimed_method_exception_surfaces_as_error() {
    let test = TestClient::new();

    let result = test.feed(&frames::method_exception("99", -32603, "Internal error"));

    assert!(result.is_err());
    match result {
        Err(DispatchError::RemoteMethod(error)) => {
            assert_eq!(error.invoke_id, InvokeId::from("99"));
            assert_eq!(error.code(), Some(-32603));
        }
        _ => panic!("Expected RemoteMethod error"),
    }
}

#[test]
fn cancelled_invocation_is_never_completed() {
    let test = TestClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let invoke_id = test
        .client()
        .invoke_method(Identifier::new(0, 0), Vec::new(), None, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert!(test.client().cancel_invocation(&invoke_id));
    let result = test.feed(&frames::method_reply(invoke_id.as_str(), Value::Null));

    assert!(matches!(
        result,
        Err(DispatchError::Callback(CallbackError::UnmatchedInvocation { .. }))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn call_method_resolves_with_the_reply() {
    let test = TestClient::new();
    let receiver = test
        .client()
        .call_method(Identifier::new(2, 0), vec![frames::text("ping")], None)
        .unwrap();

    test.feed_ok(&frames::method_reply("0", frames::text("pong")));

    assert_eq!(receiver.await.unwrap(), Ok(frames::text("pong")));
}

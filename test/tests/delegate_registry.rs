use std::{
    any::Any,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use penne_client::{
    Client, ClientHandle, Delegate, DelegateInfo, DelegateRegistry, DelegateType, DispatchError,
    GenericDelegate, SignalHandlers,
};
use penne_shared::{Identifier, IdentifierTable, Message, Specifier, Value};
use penne_test::frames::{self, message_ids::*};

struct ColumnTable {
    client: ClientHandle,
    info: DelegateInfo,
    columns: Vec<String>,
    signals: SignalHandlers,
}

impl ColumnTable {
    fn read_columns(value: &Value) -> Vec<String> {
        value
            .as_array()
            .map(|columns| {
                columns
                    .iter()
                    .filter_map(|column| column.as_text().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl DelegateType for ColumnTable {
    fn construct(client: ClientHandle, message: &Message, _specifier: Specifier) -> Self {
        Self {
            client,
            info: DelegateInfo::from_message(message),
            columns: message.get("columns").map(Self::read_columns).unwrap_or_default(),
            signals: SignalHandlers::new(),
        }
    }
}

impl Delegate for ColumnTable {
    fn info(&self) -> &DelegateInfo {
        &self.info
    }

    fn apply_update(&mut self, field: &str, value: &Value) {
        if field == "columns" {
            self.columns = Self::read_columns(value);
        }
    }

    fn signals(&self) -> &SignalHandlers {
        &self.signals
    }

    fn signals_mut(&mut self) -> &mut SignalHandlers {
        &mut self.signals
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn defaults_cover_every_specifier() {
    let registry = DelegateRegistry::with_defaults();

    assert_eq!(registry.len(), 14);
    assert!(Specifier::ALL.iter().all(|specifier| registry.contains(*specifier)));
    assert_eq!(IdentifierTable::standard().len(), 36);
}

#[test]
fn overriding_tables_keeps_fourteen_constructors() {
    let client = Client::builder()
        .delegate_type::<ColumnTable>(Specifier::Tables)
        .build()
        .unwrap();

    assert_eq!(client.delegate_registry().len(), 14);

    client
        .handle_message(&frames::create(
            TABLE_CREATE,
            0,
            0,
            vec![("columns", Value::Array(vec![frames::text("x"), frames::text("y")]))],
        ))
        .unwrap();
    client
        .handle_message(&frames::create(ENTITY_CREATE, 0, 0, vec![]))
        .unwrap();

    client.with_state(|state| {
        let table = state.get_as::<ColumnTable>(Specifier::Tables, 0).unwrap();
        assert_eq!(table.columns, vec!["x".to_string(), "y".to_string()]);
        assert!(table.client.ptr_eq(&client));
        assert!(state.get_as::<GenericDelegate>(Specifier::Entities, 0).is_some());
    });
}

#[test]
fn closure_constructors_receive_handle_message_and_specifier() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let client = Client::builder()
        .delegate(Specifier::Plots, move |client, message, specifier| {
            assert_eq!(specifier, Specifier::Plots);
            assert!(message.contains("id"));
            assert!(client.is_alive());
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(GenericDelegate::construct(client, message, specifier))
        })
        .build()
        .unwrap();

    client.handle_message(&frames::create(PLOT_CREATE, 0, 0, vec![])).unwrap();
    client.handle_message(&frames::create(PLOT_CREATE, 1, 0, vec![])).unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[test]
fn unregistered_specifier_fails_only_that_message() {
    let mut registry = DelegateRegistry::with_defaults();
    registry.unregister(Specifier::Entities);
    let client = Client::builder().delegate_registry(registry).build().unwrap();

    let result = client.handle_message(&frames::create(ENTITY_CREATE, 0, 0, vec![]));

    assert!(result.is_err());
    match result {
        Err(DispatchError::UnknownSpecifier { specifier }) => {
            assert_eq!(specifier, Specifier::Entities);
        }
        _ => panic!("Expected UnknownSpecifier error"),
    }
    assert!(client.handle_message(&frames::create(TABLE_CREATE, 0, 0, vec![])).is_ok());
}

#[test]
fn build_without_document_constructor_fails() {
    let result = Client::builder().delegate_registry(DelegateRegistry::empty()).build();

    assert!(result.is_err());
    match result {
        Err(DispatchError::UnknownSpecifier { specifier }) => {
            assert_eq!(specifier, Specifier::Document);
        }
        _ => panic!("Expected UnknownSpecifier error"),
    }
}

#[test]
fn handles_outlive_their_client() {
    let client = Client::builder().build().unwrap();
    let handle = client.handle();
    assert!(handle.is_alive());

    drop(client);

    assert!(!handle.is_alive());
    assert!(handle.upgrade().is_none());
}

/// Ignores the creation message and reports the default identity
struct Anonymous {
    info: DelegateInfo,
    signals: SignalHandlers,
    new_calls: Arc<AtomicUsize>,
}

impl Delegate for Anonymous {
    fn info(&self) -> &DelegateInfo {
        &self.info
    }

    fn on_new(&mut self, _message: &Message) {
        self.new_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn apply_update(&mut self, _field: &str, _value: &Value) {}

    fn signals(&self) -> &SignalHandlers {
        &self.signals
    }

    fn signals_mut(&mut self) -> &mut SignalHandlers {
        &mut self.signals
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn constructor_ignoring_the_message_id_is_rejected() {
    let new_calls = Arc::new(AtomicUsize::new(0));
    let counter = new_calls.clone();
    let client = Client::builder()
        .delegate(Specifier::Tables, move |_, _, _| {
            let delegate: Box<dyn Delegate> = Box::new(Anonymous {
                info: DelegateInfo::default(),
                signals: SignalHandlers::new(),
                new_calls: counter.clone(),
            });
            delegate
        })
        .build()
        .unwrap();

    let result = client.handle_message(&frames::create(TABLE_CREATE, 3, 0, vec![]));

    assert!(result.is_err());
    match result {
        Err(DispatchError::GenerationMismatch(mismatch)) => {
            assert_eq!(mismatch.left, Identifier::default());
            assert_eq!(mismatch.right, Identifier::new(3, 0));
        }
        _ => panic!("Expected GenerationMismatch error"),
    }
    client.with_state(|state| {
        assert!(!state.contains(Specifier::Tables, 3));
        assert!(!state.contains(Specifier::Tables, 0));
    });
    assert_eq!(new_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn created_delegate_is_stored_at_the_message_index_and_told_once() {
    let new_calls = Arc::new(AtomicUsize::new(0));
    let counter = new_calls.clone();
    let client = Client::builder()
        .delegate(Specifier::Tables, move |_, message, _| {
            let delegate: Box<dyn Delegate> = Box::new(Anonymous {
                info: DelegateInfo::from_message(message),
                signals: SignalHandlers::new(),
                new_calls: counter.clone(),
            });
            delegate
        })
        .build()
        .unwrap();

    client
        .handle_message(&frames::create(TABLE_CREATE, 3, 1, vec![]))
        .unwrap();

    client.with_state(|state| {
        assert_eq!(state.identifier(Specifier::Tables, 3), Some(Identifier::new(3, 1)));
        assert!(state.get_as::<Anonymous>(Specifier::Tables, 3).is_some());
    });
    assert_eq!(new_calls.load(Ordering::SeqCst), 1);
}

use super::*;
use crate::components::TextInput;
use crate::contracts::FieldLike;
use futures::channel::oneshot;
use futures::executor::block_on;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, calmform_derive::FormModel)]
struct PersonInput {
    name: String,
    age: Option<Decimal>,
}

fn person_model() -> FormValues {
    [("name", FieldValue::Null), ("age", FieldValue::Null)]
        .into_iter()
        .collect()
}

fn person_schema() -> FormSchema {
    FormSchema::builder()
        .model(person_model())
        .validator(combine_validators([
            (
                "name",
                compose_validators([is_required(), is_alphabetic()]).label("Name"),
            ),
            (
                "age",
                compose_validators([is_required(), is_numeric()]).label("Age"),
            ),
        ]))
        .build()
        .expect("person schema is complete")
}

#[derive(Clone, Default)]
struct Recorder {
    successes: Arc<AtomicUsize>,
    errors: Arc<Mutex<Vec<SubmitError>>>,
    messages: Arc<Mutex<Vec<FieldErrors>>>,
    requests: Arc<Mutex<Vec<MutationRequest>>>,
}

impl Recorder {
    fn callbacks(&self) -> FormCallbacks {
        let successes = self.successes.clone();
        let errors = self.errors.clone();
        let messages = self.messages.clone();
        FormCallbacks::new()
            .on_success(move || {
                successes.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |reason| errors.lock().expect("errors lock").push(reason.clone()))
            .on_error_message(move |field_errors| {
                messages
                    .lock()
                    .expect("messages lock")
                    .push(field_errors.clone())
            })
    }

    /// Mutation that records its request and resolves with `result`.
    fn mutation(&self, result: Result<(), MutationError>) -> FormMutation {
        let requests = self.requests.clone();
        FormMutation::from_async("PersonInput", move |request| {
            requests.lock().expect("requests lock").push(request);
            let result = result.clone();
            async move { result }
        })
    }

    /// Mutation that stays pending until the returned sender fires.
    fn gated_mutation(&self) -> (FormMutation, oneshot::Sender<Result<(), MutationError>>) {
        let (sender, receiver) = oneshot::channel();
        let receiver = Arc::new(Mutex::new(Some(receiver)));
        let requests = self.requests.clone();
        let mutation = FormMutation::from_async("PersonInput", move |request| {
            requests.lock().expect("requests lock").push(request);
            let receiver = receiver.lock().expect("receiver lock").take();
            async move {
                match receiver {
                    Some(receiver) => receiver
                        .await
                        .unwrap_or_else(|_| Err(MutationError::new("gate dropped"))),
                    None => Ok(()),
                }
            }
        });
        (mutation, sender)
    }

    fn success_count(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    fn mutation_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    fn errors(&self) -> Vec<SubmitError> {
        self.errors.lock().expect("errors lock").clone()
    }

    fn messages(&self) -> Vec<FieldErrors> {
        self.messages.lock().expect("messages lock").clone()
    }
}

fn person_form(recorder: &Recorder) -> FormController {
    FormController::initialize(
        FormConfig::new(person_schema(), recorder.mutation(Ok(()))).callbacks(recorder.callbacks()),
        None,
    )
}

#[test]
fn valid_submit_runs_mutation_with_current_values() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);

    controller.set_field_value("name", "Alice").expect("set name");
    controller.set_field_value("age", "30").expect("set age");
    block_on(controller.submit()).expect("submit");

    let requests = recorder.requests.lock().expect("requests lock").clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(&*requests[0].input_shape, "PersonInput");
    assert_eq!(
        requests[0].input,
        FormValues::new().with("name", "Alice").with("age", "30")
    );
    assert_eq!(recorder.success_count(), 1);
    assert!(recorder.errors().is_empty());
    assert!(recorder.messages().is_empty());
    assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn invalid_submit_reports_error_mapping_without_mutation() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);

    controller.set_field_value("name", "").expect("set name");
    block_on(controller.submit()).expect("submit");

    let expected = person_schema()
        .validate(&controller.values().expect("values"))
        .expect("validate");
    assert_eq!(
        expected.get("name").map(|message| &**message),
        Some("Name is required")
    );
    assert_eq!(recorder.messages(), vec![expected.clone()]);
    assert_eq!(recorder.mutation_count(), 0);
    assert_eq!(recorder.success_count(), 0);
    assert_eq!(controller.errors().expect("errors"), expected);
    assert_eq!(
        controller.field_error("name").expect("field error").as_deref(),
        Some("Name is required")
    );

    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.submit_state, SubmitState::Idle);
    assert_eq!(snapshot.submit_count, 1);
    assert!(!snapshot.is_valid);
}

#[test]
fn failed_validation_can_be_fixed_and_retried() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);

    block_on(controller.submit()).expect("first submit");
    assert_eq!(recorder.messages().len(), 1);

    controller.set_field_value("name", "Alice").expect("set name");
    assert_eq!(controller.field_error("name").expect("error"), None);
    assert!(controller.field_error("age").expect("error").is_some());

    controller.set_field_value("age", "41").expect("set age");
    block_on(controller.submit()).expect("second submit");
    assert_eq!(recorder.mutation_count(), 1);
    assert_eq!(recorder.success_count(), 1);
    assert!(controller.errors().expect("errors").is_empty());
}

#[test]
fn mutation_failure_is_reported_through_on_error() {
    let recorder = Recorder::default();
    let controller = FormController::initialize(
        FormConfig::new(
            person_schema(),
            recorder.mutation(Err(MutationError::new("backend unavailable"))),
        )
        .callbacks(recorder.callbacks()),
        Some(FormValues::new().with("name", "Bob").with("age", "25")),
    );

    block_on(controller.submit()).expect("submit");
    assert_eq!(
        recorder.errors(),
        vec![SubmitError::Mutation(MutationError::new("backend unavailable"))]
    );
    assert_eq!(recorder.success_count(), 0);
    assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn panicking_validator_surfaces_schema_error_and_returns_to_idle() {
    let recorder = Recorder::default();
    let schema = FormSchema::new(person_model(), |_: &FormValues| -> FieldErrors {
        panic!("rules table missing")
    });
    let controller = FormController::initialize(
        FormConfig::new(schema, recorder.mutation(Ok(()))).callbacks(recorder.callbacks()),
        None,
    );

    block_on(controller.submit()).expect("submit");
    assert_eq!(
        recorder.errors(),
        vec![SubmitError::Schema(SchemaError::Panicked(
            "rules table missing".into()
        ))]
    );
    assert_eq!(recorder.mutation_count(), 0);
    assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn failing_validator_surfaces_schema_error_through_on_error() {
    let recorder = Recorder::default();
    let schema = FormSchema::new(
        person_model(),
        try_validator(|_: &FormValues| Err(SchemaError::Validator("rules unavailable".into()))),
    );
    let controller = FormController::initialize(
        FormConfig::new(schema, recorder.mutation(Ok(()))).callbacks(recorder.callbacks()),
        Some(FormValues::new().with("name", "Alice").with("age", "30")),
    );

    block_on(controller.submit()).expect("submit");
    assert_eq!(
        recorder.errors(),
        vec![SubmitError::Schema(SchemaError::Validator(
            "rules unavailable".into()
        ))]
    );
    assert_eq!(recorder.mutation_count(), 0);
    assert_eq!(recorder.success_count(), 0);
    assert!(recorder.messages().is_empty());
    assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn dropped_submit_returns_form_to_idle() {
    let recorder = Recorder::default();
    let (mutation, release) = recorder.gated_mutation();
    let controller = FormController::initialize(
        FormConfig::new(person_schema(), mutation).callbacks(recorder.callbacks()),
        Some(FormValues::new().with("name", "Alice").with("age", "30")),
    );

    block_on(async {
        let mut pending = Box::pin(controller.submit());
        assert!(futures::poll!(pending.as_mut()).is_pending());
        assert_eq!(
            controller.submit_state().expect("state"),
            SubmitState::Submitting
        );
    });
    drop(release);

    assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
    assert_eq!(recorder.success_count(), 0);
    assert!(recorder.errors().is_empty());

    controller.reset_to_initial().expect("reset after cancel");
    block_on(controller.submit()).expect("retry");
    assert_eq!(recorder.mutation_count(), 2);
    assert_eq!(recorder.success_count(), 1);
    assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn unmounted_form_rejects_edits() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    controller.set_field_value("name", "Alice").expect("set name");
    controller.unmount().expect("unmount");

    assert_eq!(
        controller.set_field_value("name", "Bob"),
        Err(FormError::Unmounted)
    );
    assert_eq!(
        controller.field_value("name").expect("value"),
        Some(FieldValue::from("Alice"))
    );
}

#[test]
fn reentrant_submit_is_rejected_while_mutation_is_pending() {
    let recorder = Recorder::default();
    let (mutation, release) = recorder.gated_mutation();
    let controller = FormController::initialize(
        FormConfig::new(person_schema(), mutation).callbacks(recorder.callbacks()),
        Some(FormValues::new().with("name", "Alice").with("age", "30")),
    );

    block_on(async {
        let mut first = Box::pin(controller.submit());
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(controller.is_submitting().expect("submitting flag"));
        assert_eq!(
            controller.submit_state().expect("state"),
            SubmitState::Submitting
        );

        assert_eq!(controller.submit().await, Err(FormError::AlreadySubmitting));
        assert_eq!(recorder.mutation_count(), 1);

        release.send(Ok(())).expect("release mutation");
        first.await.expect("first submit");
    });

    assert_eq!(recorder.mutation_count(), 1);
    assert_eq!(recorder.success_count(), 1);
    assert!(!controller.is_submitting().expect("submitting flag"));
}

#[test]
fn unmount_during_submit_drops_result_silently() {
    let recorder = Recorder::default();
    let (mutation, release) = recorder.gated_mutation();
    let controller = FormController::initialize(
        FormConfig::new(person_schema(), mutation).callbacks(recorder.callbacks()),
        Some(FormValues::new().with("name", "Alice").with("age", "30")),
    );

    block_on(async {
        let mut pending = Box::pin(controller.submit());
        assert!(futures::poll!(pending.as_mut()).is_pending());

        controller.unmount().expect("unmount");
        release
            .send(Err(MutationError::new("too late")))
            .expect("release mutation");
        pending.await.expect("submit completes quietly");
    });

    assert_eq!(recorder.success_count(), 0);
    assert!(recorder.errors().is_empty());
    assert!(recorder.messages().is_empty());
    assert_eq!(
        block_on(controller.submit()),
        Err(FormError::Unmounted)
    );
}

#[test]
fn dropping_mount_unmounts_its_form() {
    let recorder = Recorder::default();
    let mut mount = FormMount::new(FormConfig::new(person_schema(), recorder.mutation(Ok(()))));
    let controller = mount.mount();
    assert!(controller.is_mounted().expect("mounted"));

    drop(mount);
    assert!(!controller.is_mounted().expect("mounted"));
}

#[test]
fn unknown_field_is_rejected() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);

    assert_eq!(
        controller.set_field_value("email", "a@b.c"),
        Err(FormError::UnknownField(FieldKey::new("email")))
    );
    assert!(matches!(
        controller.field("email", InputType::Email),
        Err(FormError::UnknownField(_))
    ));
    assert_eq!(controller.values().expect("values"), person_model());
}

#[test]
fn repeated_identical_edit_leaves_state_unchanged() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    block_on(controller.submit()).expect("submit to populate errors");

    controller.set_field_value("name", "Alice").expect("first edit");
    let after_first = controller.snapshot().expect("snapshot");
    controller.set_field_value("name", "Alice").expect("second edit");
    let after_second = controller.snapshot().expect("snapshot");

    assert_eq!(after_first, after_second);
    assert!(!after_second.errors.contains_key("name"));
    assert!(after_second.errors.contains_key("age"));
}

#[test]
fn on_change_mode_validates_the_edited_field_only() {
    let recorder = Recorder::default();
    let controller = FormController::initialize(
        FormConfig::new(person_schema(), recorder.mutation(Ok(()))).options(FormOptions {
            validation_mode: ValidationMode::OnChange,
            ..FormOptions::default()
        }),
        None,
    );

    controller.set_field_value("age", "abc").expect("set age");
    assert_eq!(
        controller.field_error("age").expect("error").as_deref(),
        Some("Age must be numeric")
    );
    assert_eq!(controller.field_error("name").expect("error"), None);

    controller.set_field_value("age", "12").expect("fix age");
    assert_eq!(controller.field_error("age").expect("error"), None);
}

#[test]
fn hydration_waits_for_loading_to_finish() {
    let recorder = Recorder::default();
    let mut mount = FormMount::new(FormConfig::new(person_schema(), recorder.mutation(Ok(()))));

    assert!(matches!(
        mount.observe(QueryResult::loading()),
        MountStatus::Pending
    ));
    assert!(!mount.is_mounted());

    let hydrated = FormValues::new().with("name", "Bob").with("age", "25");
    let status = mount.observe(QueryResult::ready(Some(hydrated.clone())));
    let controller = status.controller().expect("mounted").clone();
    assert_eq!(controller.values().expect("values"), hydrated);

    let again = mount.observe(QueryResult::ready(Some(FormValues::new().with("name", "Eve"))));
    assert_eq!(
        again.controller().expect("mounted").form_id(),
        controller.form_id()
    );
    assert_eq!(controller.values().expect("values"), hydrated);
}

#[test]
fn empty_hydration_falls_back_to_schema_model() {
    let recorder = Recorder::default();
    let mut mount = FormMount::new(FormConfig::new(person_schema(), recorder.mutation(Ok(()))));
    let status = mount.observe(QueryResult::ready(Some(FormValues::new())));
    assert_eq!(
        status.controller().expect("mounted").values().expect("values"),
        person_model()
    );
}

#[test]
fn hydrate_polls_source_until_ready() {
    let recorder = Recorder::default();
    let polls = Arc::new(AtomicUsize::new(0));
    let source = {
        let polls = polls.clone();
        move || -> BoxedQueryFuture<'static> {
            let attempt = polls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if attempt < 2 {
                    QueryResult::loading()
                } else {
                    QueryResult::ready(Some(FormValues::new().with("name", "Bob").with("age", "25")))
                }
            })
        }
    };

    let mut mount = FormMount::new(FormConfig::new(person_schema(), recorder.mutation(Ok(()))));
    let controller = block_on(mount.hydrate(&source, std::time::Duration::ZERO));
    assert_eq!(polls.load(Ordering::SeqCst), 3);
    assert_eq!(
        controller.field_value("name").expect("value"),
        Some(FieldValue::from("Bob"))
    );
}

#[test]
fn binder_exposes_value_change_and_error() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    let age = controller.field("age", InputType::Number).expect("age binder");

    age.on_change("old").expect("change age");
    block_on(controller.submit()).expect("submit");

    let binding = age.binding().expect("binding");
    assert_eq!(binding.value, FieldValue::from("old"));
    assert_eq!(binding.input_type, InputType::Number);
    assert_eq!(binding.error_message.as_deref(), Some("Age must be numeric"));

    age.on_change("30").expect("fix age");
    assert_eq!(age.error_message().expect("error"), None);
}

#[test]
fn bound_input_renders_state_and_forwards_edits() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    block_on(controller.submit()).expect("submit");

    let name = controller.text_field("name").expect("name binder");
    let input = name
        .bind(TextInput::new().label("Name"))
        .expect("bind input");
    assert_eq!(input.current_error().map(|m| &**m), Some("Name is required"));
    assert_eq!(input.current_label().map(|m| &**m), Some("Name"));
    assert_eq!(&*input.display_text(), "");

    input.change("Alice");
    assert_eq!(
        controller.field_value("name").expect("value"),
        Some(FieldValue::from("Alice"))
    );
    assert_eq!(controller.field_error("name").expect("error"), None);

    let rerendered = name.bind(TextInput::new()).expect("bind input");
    assert_eq!(rerendered.current_error(), None);
    assert_eq!(&*rerendered.display_text(), "Alice");
}

#[test]
fn adapters_apply_independently() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    block_on(controller.submit()).expect("submit");
    let age = controller.field("age", InputType::Number).expect("age binder");

    let message_only = age
        .with_validation_message(TextInput::new())
        .expect("message adapter");
    assert_eq!(message_only.current_value(), &FieldValue::Null);
    assert!(message_only.current_error().is_some());

    let input_only = age.with_input(TextInput::new()).expect("input adapter");
    assert_eq!(input_only.current_input_type(), InputType::Number);
    assert_eq!(input_only.current_error(), None);
}

#[test]
fn draft_store_roundtrip_loads_and_clears() {
    let recorder = Recorder::default();
    let store = InMemoryDraftStore::new();
    let controller = FormController::initialize(
        FormConfig::new(person_schema(), recorder.mutation(Ok(())))
            .options(FormOptions::named("sampleForm")),
        None,
    );

    controller.set_field_value("name", "Draft").expect("set name");
    controller.save_draft(&store).expect("save draft");

    controller.reset_to_initial().expect("reset form");
    assert_eq!(controller.values().expect("values"), person_model());

    assert!(controller.load_draft(&store).expect("load draft"));
    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.values.get("name"), Some(&FieldValue::from("Draft")));
    assert!(snapshot.is_dirty);

    controller.clear_draft(&store).expect("clear draft");
    assert!(!controller.load_draft(&store).expect("load after clear"));
}

#[test]
fn draft_ignores_fields_the_form_does_not_know() {
    let recorder = Recorder::default();
    let store = InMemoryDraftStore::new();
    store
        .save(
            "sampleForm",
            &FormValues::new().with("name", "Bob").with("__typename", "Person"),
        )
        .expect("seed draft");
    let controller = FormController::initialize(
        FormConfig::new(person_schema(), recorder.mutation(Ok(())))
            .options(FormOptions::named("sampleForm")),
        None,
    );

    assert!(controller.load_draft(&store).expect("load draft"));
    assert!(!controller.contains_field("__typename").expect("contains"));
    assert_eq!(
        controller.field_value("name").expect("value"),
        Some(FieldValue::from("Bob"))
    );
}

#[test]
fn drafts_require_a_form_name() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    assert_eq!(
        controller.save_draft(&InMemoryDraftStore::new()),
        Err(FormError::MissingFormName)
    );
}

#[test]
fn typed_model_round_trips_through_form_values() {
    let person = PersonInput {
        name: "Alice".to_string(),
        age: Some(Decimal::from(30_i64)),
    };
    let values = person.to_values();
    assert_eq!(values.get("age"), Some(&FieldValue::Number(Decimal::from(30_i64))));
    let decoded = PersonInput::from_values(&values).expect("decode person");
    assert_eq!(decoded.name, "Alice");
    assert_eq!(decoded.age, Some(Decimal::from(30_i64)));
    assert_eq!(decoded, person);

    let fields = PersonInput::fields();
    assert_eq!(fields.name().as_str(), "name");
    assert_eq!(fields.age().as_str(), "age");
    assert_eq!(
        PersonInput::field_keys(),
        vec![FieldKey::new("name"), FieldKey::new("age")]
    );
}

#[test]
fn mutation_request_decodes_into_typed_model() {
    let recorder = Recorder::default();
    let controller = person_form(&recorder);
    controller.set_field_value("name", "Alice").expect("set name");
    controller.set_field_value("age", "30").expect("set age");
    block_on(controller.submit()).expect("submit");

    let request = recorder.requests.lock().expect("requests lock")[0].clone();
    assert_eq!(
        request.decode::<PersonInput>(),
        Ok(PersonInput {
            name: "Alice".to_string(),
            age: Some(Decimal::from(30_i64)),
        })
    );
    assert!(matches!(
        FormController::initialize(
            FormConfig::new(person_schema(), recorder.mutation(Ok(()))),
            None
        )
        .decode::<PersonInput>(),
        Err(FormError::Model(ModelError::InvalidField { .. }))
    ));
}

#[test]
fn forms_do_not_share_state() {
    let recorder = Recorder::default();
    let first = person_form(&recorder);
    let second = person_form(&recorder);

    first.set_field_value("name", "Alice").expect("set name");
    assert_ne!(first.form_id(), second.form_id());
    assert_eq!(second.field_value("name").expect("value"), Some(FieldValue::Null));
}

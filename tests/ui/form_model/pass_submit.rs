use calmform::form::{
    FormConfig, FormController, FormModel, FormMutation, FormSchema, SchemaValidator,
    combine_validators, compose_validators, is_required,
};

#[derive(Clone, calmform::form::FormModel)]
struct SignupForm {
    username: String,
}

fn main() {
    let blank = SignupForm {
        username: String::new(),
    };
    let validator = combine_validators([(
        SignupForm::fields().username(),
        compose_validators([is_required()]).label("Username"),
    )]);
    assert!(!validator
        .validate(&blank.to_values())
        .expect("validate")
        .is_empty());

    let schema = FormSchema::new(blank.to_values(), validator);
    let mutation = FormMutation::from_async("SignupInput", |_request| async {
        Ok::<(), calmform::form::MutationError>(())
    });
    let controller = FormController::initialize(FormConfig::new(schema, mutation), None);
    controller
        .set_field_value(SignupForm::fields().username(), "calm")
        .expect("known field");
    let decoded = controller.decode::<SignupForm>().expect("decode");
    assert_eq!(decoded.username, "calm");
}

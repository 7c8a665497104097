use crate::form::FormModel as _;
use rust_decimal::Decimal;

#[derive(Clone, crate::form::FormModel)]
struct Facade {
    title: String,
    amount: Decimal,
}

#[test]
fn prelude_exports_core_types() {
    use crate::prelude::*;

    let _ = TextInput::new().label("Title").required(true);
    let _ = FormOptions::default();
    let _ = ValidationMode::OnSubmit;
    let _ = InputType::Number;
    let _ = QueryResult::loading();
    let _ = FormCallbacks::new();
    let _ = I18nManager::with_locale(Locale::from("en"));
    let _ = compose_validators([is_required(), is_alphabetic(), is_numeric()]).label("Title");
}

#[test]
fn derived_fields_are_reachable_from_the_facade() {
    let fields = Facade::fields();
    assert_eq!(fields.title().as_str(), "title");
    assert_eq!(fields.amount().as_str(), "amount");
    let values = Facade {
        title: "Invoice".into(),
        amount: Decimal::new(1200, 2),
    }
    .to_values();
    assert_eq!(values.len(), 2);
}

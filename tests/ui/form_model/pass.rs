use calmform::form::{FieldValue, FormModel};
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, calmform::form::FormModel)]
struct DemoForm {
    email: String,
    age: Option<Decimal>,
    subscribed: bool,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(fields.subscribed().as_str(), "subscribed");

    let model = DemoForm {
        email: "a@calm.ui".to_string(),
        age: None,
        subscribed: true,
    };
    let values = model.to_values();
    assert_eq!(values.get("age"), Some(&FieldValue::Null));
    assert_eq!(values.get("subscribed"), Some(&FieldValue::Bool(true)));
    assert_eq!(DemoForm::from_values(&values), Ok(model));
}

pub mod logger;

use validator::ValidationErrors;

/// Flattens validator errors into a single `"; "`-separated message.
///
/// Errors without a custom message fall back to `"<field> is invalid"` so that
/// callers always get something readable.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Name of the first field that failed validation, if any.
pub fn first_invalid_field(errors: &ValidationErrors) -> Option<String> {
    let mut names: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|k| k.to_string())
        .collect();
    names.sort();
    names.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 3))]
        name: String,
    }

    #[test]
    fn messages_are_joined_in_field_order() {
        let s = Sample {
            email: "nope".into(),
            name: "a".into(),
        };
        let errs = s.validate().unwrap_err();
        assert_eq!(
            format_validation_errors(&errs),
            "Invalid email format; name is invalid"
        );
        assert_eq!(first_invalid_field(&errs).as_deref(), Some("email"));
    }
}

//! Assertion evaluation against JSON bodies and rendered pages

use serde_json::Value;

use crate::browser::{Locator, PageSession};
use crate::common::{truncate, Error, Result};

use super::config::{JsonAssertion, PageAssertion};

/// Follow a dotted path (`orders.total`, `drivers.0.name`) into a JSON value
pub fn lookup<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    field.split('.').try_fold(body, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Check one JSON assertion, returning an assertion failure on mismatch
pub fn check_json(body: &Value, assertion: &JsonAssertion) -> Result<()> {
    let check = format!("field '{}'", assertion.field);
    let actual = lookup(body, &assertion.field);

    if let Some(expected) = &assertion.equals {
        match actual {
            Some(value) if value == expected => {}
            Some(value) => return Err(Error::assertion(&check, expected, value)),
            None => return Err(Error::assertion(&check, expected, "<missing>")),
        }
    }

    if let Some(expected_substr) = &assertion.contains {
        match actual {
            Some(Value::String(s)) if s.contains(expected_substr.as_str()) => {}
            Some(value) => {
                return Err(Error::assertion(
                    &check,
                    format!("value containing '{}'", expected_substr),
                    value,
                ))
            }
            None => {
                return Err(Error::assertion(
                    &check,
                    format!("value containing '{}'", expected_substr),
                    "<missing>",
                ))
            }
        }
    }

    Ok(())
}

/// Check one page assertion against the session's current page
///
/// A locator that matches nothing is an error, not an assertion failure:
/// the page is not the page the scenario expects.
pub async fn check_page(page: &mut dyn PageSession, url: &str, assertion: &PageAssertion) -> Result<()> {
    match assertion {
        PageAssertion::TitleMatches { pattern } => {
            let re = regex::Regex::new(pattern)
                .map_err(|e| Error::Config(format!("Invalid title pattern '{}': {}", pattern, e)))?;
            let title = page.title().await?;
            if !re.is_match(&title) {
                return Err(Error::assertion(
                    "title",
                    format!("matching /{}/", pattern),
                    format!("'{}'", title),
                ));
            }
        }
        PageAssertion::TextContains { selector, text } => {
            let element = located(page, url, &Locator::Css(selector.clone())).await?;
            if !element.text.contains(text.as_str()) {
                return Err(Error::assertion(
                    &format!("text of '{}'", selector),
                    format!("containing '{}'", text),
                    format!("'{}'", truncate(&element.text, 80)),
                ));
            }
        }
        PageAssertion::TextVisible { text } => {
            let element = located(page, url, &Locator::text(text)).await?;
            if !element.displayed {
                return Err(Error::assertion(&format!("text '{}'", text), "visible", "hidden"));
            }
        }
        PageAssertion::LinkVisible { href } => {
            let element = located(page, url, &Locator::link(href)).await?;
            if !element.displayed {
                return Err(Error::assertion(&format!("link '{}'", href), "visible", "hidden"));
            }
        }
    }
    Ok(())
}

async fn located(
    page: &mut dyn PageSession,
    url: &str,
    locator: &Locator,
) -> Result<crate::browser::ElementState> {
    page.find(locator).await?.ok_or_else(|| Error::ElementNotFound {
        locator: locator.to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn equals(field: &str, value: Value) -> JsonAssertion {
        JsonAssertion {
            field: field.to_string(),
            equals: Some(value),
            contains: None,
        }
    }

    fn contains(field: &str, text: &str) -> JsonAssertion {
        JsonAssertion {
            field: field.to_string(),
            equals: None,
            contains: Some(text.to_string()),
        }
    }

    #[test]
    fn test_lookup_nested_paths() {
        let body = json!({
            "orders": { "total": 12, "today": 3 },
            "drivers": [{ "name": "John Doe" }]
        });
        assert_eq!(lookup(&body, "orders.total"), Some(&json!(12)));
        assert_eq!(lookup(&body, "drivers.0.name"), Some(&json!("John Doe")));
        assert_eq!(lookup(&body, "drivers.1.name"), None);
        assert_eq!(lookup(&body, "orders.total.extra"), None);
    }

    #[test]
    fn test_health_fields_pass() {
        let body = json!({"status": "healthy", "service": "printke-api", "platform": "kubernetes"});
        for (field, value) in [
            ("status", "healthy"),
            ("service", "printke-api"),
            ("platform", "kubernetes"),
        ] {
            check_json(&body, &equals(field, json!(value))).unwrap();
        }
    }

    #[test]
    fn test_degraded_status_names_field() {
        let body = json!({"status": "degraded", "service": "printke-api", "platform": "kubernetes"});
        let err = check_json(&body, &equals("status", json!("healthy"))).unwrap_err();
        assert!(err.is_assertion());
        let detail = err.to_string();
        assert!(detail.contains("'status'"), "{}", detail);
        assert!(detail.contains("\"healthy\""), "{}", detail);
        assert!(detail.contains("\"degraded\""), "{}", detail);
    }

    #[test]
    fn test_message_substring() {
        let welcome = json!({"message": "Welcome to PrintKe API v1"});
        check_json(&welcome, &contains("message", "PrintKe API")).unwrap();

        let hello = json!({"message": "Hello"});
        let err = check_json(&hello, &contains("message", "PrintKe API")).unwrap_err();
        assert!(err.is_assertion());
        assert!(err.to_string().contains("\"Hello\""));
    }

    #[test]
    fn test_missing_field_is_assertion_failure() {
        let body = json!({"status": "healthy"});
        let err = check_json(&body, &equals("platform", json!("kubernetes"))).unwrap_err();
        assert!(err.is_assertion());
        assert!(err.to_string().contains("<missing>"));
    }

    #[test]
    fn test_contains_on_non_string_fails() {
        let body = json!({"message": 42});
        assert!(check_json(&body, &contains("message", "4")).is_err());
    }
}

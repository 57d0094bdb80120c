use lazy_static::lazy_static;
use scraper::{Html, Selector};

lazy_static! {
    static ref HIDDEN_INPUT: Selector = Selector::parse(r#"input[type="hidden"][name]"#).unwrap();
}

/// Ordered form fields sent back to an ASP.NET page.
pub type Form = Vec<(String, String)>;

/// Collects the hidden `<input>` fields of a page (view state and friends).
///
/// Inputs without a value are skipped, the server does not expect them back.
pub fn hidden_inputs(page: &str) -> Form {
    let html = Html::parse_document(page);
    html.select(&HIDDEN_INPUT)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").filter(|v| !v.is_empty())?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Sets `name` to `value`, replacing any previous field of that name.
pub fn set_field(form: &mut Form, name: &str, value: &str) {
    match form.iter_mut().find(|(n, _)| n == name) {
        Some((_, v)) => *v = value.to_string(),
        None => form.push((name.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_hidden_inputs_in_order() {
        let page = r#"
            <form>
              <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="dDw1&amp;Mj" />
              <input type="text" name="ctl00$MiniProfile$loginUsername" value="" />
              <input type="hidden" name="__EVENTTARGET" value="" />
              <input type="hidden" name="__EVENTVALIDATION" value="abc" />
            </form>"#;
        assert_eq!(
            hidden_inputs(page),
            vec![
                ("__VIEWSTATE".to_string(), "dDw1&Mj".to_string()),
                ("__EVENTVALIDATION".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn set_field_replaces_in_place() {
        let mut form = vec![("a".to_string(), "1".to_string())];
        set_field(&mut form, "b", "2");
        set_field(&mut form, "a", "3");
        assert_eq!(
            form,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }
}

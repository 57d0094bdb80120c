use async_trait::async_trait;
use gc_fetcher::{hidden_inputs, set_field, Fetcher, Form};

use crate::ns;
use crate::parser::{ParseArgs, Parser};
use crate::record::Record;

/// Replaces the "about me" text of the user's profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditProfile;

#[async_trait]
impl Parser for EditProfile {
    async fn parse(&self, fetcher: &Fetcher, args: &ParseArgs) -> anyhow::Result<Record> {
        let details = args.require(ns::args::DETAILS)?;
        save_profile(fetcher, details).await?;
        Ok(Record::ProfileSaved)
    }
}

pub async fn save_profile(fetcher: &Fetcher, details: &str) -> anyhow::Result<()> {
    let page = fetcher.get_authenticated(ns::urls::EDIT_PROFILE).await?;
    let form = profile_form(&page, details);
    log::debug!("Saving profile details ({} chars).", details.chars().count());
    fetcher
        .post_authenticated(ns::urls::EDIT_PROFILE, &form)
        .await?;
    Ok(())
}

/// Builds the postback of the profile edit page.
pub fn profile_form(page: &str, details: &str) -> Form {
    let mut form = hidden_inputs(page);
    set_field(&mut form, ns::fields::PROFILE_DETAILS, details);
    set_field(&mut form, ns::fields::PROFILE_SAVE, "Save Changes");
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_keeps_view_state() {
        let page = r#"<form><input type="hidden" name="__VIEWSTATE" value="state" />
            <textarea name="ctl00$ContentBody$uxProfileDetails">old</textarea></form>"#;
        let form = profile_form(page, "new text");
        assert_eq!(
            form,
            vec![
                ("__VIEWSTATE".to_string(), "state".to_string()),
                (ns::fields::PROFILE_DETAILS.to_string(), "new text".to_string()),
                (ns::fields::PROFILE_SAVE.to_string(), "Save Changes".to_string()),
            ]
        );
    }
}

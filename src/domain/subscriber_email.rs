/// An email address submitted through the subscription form.
///
/// Only presence is enforced: the provider is the authority on what counts as
/// a deliverable address, so anything non-blank is passed through (trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        let trimmed = email.trim();
        match trimmed.is_empty() {
            true => Err("Email is required.".to_string()),
            false => Ok(Self(trimmed.to_string())),
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

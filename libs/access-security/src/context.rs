use secrecy::SecretString;

use crate::value::ScopeValue;

/// `SecurityContext` carries the authenticated principal of a request.
///
/// Built once per request by the principal loader and immutable afterwards.
/// A context without a subject id is anonymous.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    /// Subject ID of the authenticated user. `None` for anonymous requests.
    subject_id: Option<ScopeValue>,
    /// Subject type classification, usually the user model name.
    subject_type: Option<String>,
    /// Group key embedded on the user record itself, if any.
    subject_group_id: Option<ScopeValue>,
    /// Id of the access token the request was authenticated with.
    /// Never serialized. `Debug` redacts the value.
    #[serde(skip)]
    access_token: Option<SecretString>,
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Create an anonymous `SecurityContext` with no subject.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<&ScopeValue> {
        self.subject_id.as_ref()
    }

    #[must_use]
    pub fn subject_type(&self) -> Option<&str> {
        self.subject_type.as_deref()
    }

    /// The group foreign key found on the principal's own record.
    #[must_use]
    pub fn subject_group_id(&self) -> Option<&ScopeValue> {
        self.subject_group_id.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.subject_id.is_some()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<ScopeValue>,
    subject_type: Option<String>,
    subject_group_id: Option<ScopeValue>,
    access_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: impl Into<ScopeValue>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    #[must_use]
    pub fn subject_type(mut self, subject_type: &str) -> Self {
        self.subject_type = Some(subject_type.to_owned());
        self
    }

    #[must_use]
    pub fn subject_group_id(mut self, group_id: Option<ScopeValue>) -> Self {
        self.subject_group_id = group_id;
        self
    }

    #[must_use]
    pub fn access_token(mut self, token: impl Into<SecretString>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id,
            subject_type: self.subject_type,
            subject_group_id: self.subject_group_id,
            access_token: self.access_token,
        }
    }
}

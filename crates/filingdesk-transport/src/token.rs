//! Bearer token accessors.
//!
//! Token issuance lives elsewhere; the request client only reads the
//! current value, once per attempt, through [`TokenAccessor`].

/// Synchronous read of the current bearer credential.
pub trait TokenAccessor: Send + Sync + 'static {
    fn token(&self) -> Option<String>;
}

impl<F> TokenAccessor for F
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// No credential, ever.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenAccessor for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed credential.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }
}

impl TokenAccessor for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the credential from an environment variable on every call, so a
/// refreshed value is picked up without restarting.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub const DEFAULT_VAR: &'static str = "FILINGDESK_TOKEN";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl TokenAccessor for EnvToken {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_accessor() {
        let accessor = || Some("a.b.c".to_string());
        assert_eq!(accessor.token().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn static_and_none() {
        assert_eq!(StaticToken::new("x.y.z").token().as_deref(), Some("x.y.z"));
        assert_eq!(StaticToken::default().token(), None);
        assert_eq!(NoToken.token(), None);
    }

    #[test]
    fn env_accessor_missing_var_is_none() {
        let accessor = EnvToken::new("FILINGDESK_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert_eq!(accessor.token(), None);
    }
}

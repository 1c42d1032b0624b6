use crate::constants::REDACTED;
use std::fmt::{Debug, Display, Formatter};

/// A launch secret, such as the administrator password of an image template.
///
/// `Debug` and `Display` print a fixed mask so that a `Password` can sit inside structs that are
/// logged without leaking its value. The only way to read it is [`Password::expose`].
#[derive(Clone, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// Returns the secret value. Do not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password({})", REDACTED)
    }
}

impl Display for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(REDACTED, f)
    }
}

//! Reply decoding into a gate time and an ordered directive queue.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

use crate::protocol::gate_time::GateTime;
use crate::Result;

/// Separator between reply fields.
pub const FIELD_SEPARATOR: char = ';';

/// One instruction emitted by the model for the agent to act on.
///
/// Content is application-defined and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive(String);

impl Directive {
    /// Wrap a directive string.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the directive text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the directive text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Directive {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Directives of one cycle, consumed strictly front to back.
///
/// Iterating drains the queue; once empty it stays empty.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DirectiveQueue(VecDeque<Directive>);

impl DirectiveQueue {
    /// An empty queue, returned when a cycle yields no guidance.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of directives not yet consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether every directive has been consumed (or none were sent).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The next directive, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&Directive> {
        self.0.front()
    }
}

impl Iterator for DirectiveQueue {
    type Item = Directive;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl ExactSizeIterator for DirectiveQueue {}

impl FromIterator<Directive> for DirectiveQueue {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A successfully decoded reply.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedResponse {
    /// Reseeds the update scheduler.
    pub gate: GateTime,
    /// Every field after the first, in original order.
    pub directives: DirectiveQueue,
}

/// Split a raw reply into its gate time and directives.
///
/// Empty fields are kept as empty directives; nothing is trimmed.
///
/// # Errors
///
/// Returns `AppError::TimestampFormat` if the first field is not a valid
/// gate timestamp.
pub fn decode(raw: &str) -> Result<DecodedResponse> {
    let mut fields = raw.split(FIELD_SEPARATOR);
    // `split` always yields at least one field.
    let gate = GateTime::parse(fields.next().unwrap_or_default())?;
    let directives = fields.map(Directive::new).collect();
    Ok(DecodedResponse { gate, directives })
}

/// Render a reply in the wire format [`decode`] reads.
#[must_use]
pub fn encode<S: AsRef<str>>(gate: GateTime, directives: &[S]) -> String {
    let mut raw = gate.encode();
    for directive in directives {
        raw.push(FIELD_SEPARATOR);
        raw.push_str(directive.as_ref());
    }
    raw
}

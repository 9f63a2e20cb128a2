use crate::payload::Payload;

/// Navigation state over a payload's fields.
///
/// The field count is computed on first use and cached until [`reset`].
/// Movement clamps to `[0, field_count - 1]` and never wraps.
///
/// [`reset`]: FieldCursor::reset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCursor {
    field_count: Option<usize>,
    current: usize,
}

impl FieldCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached count and return to field 0.
    pub fn reset(&mut self) {
        self.field_count = None;
        self.current = 0;
    }

    /// Current index, or `None` when the payload has no fields.
    pub fn current(&mut self, payload: &Payload) -> Option<usize> {
        (self.count(payload) > 0).then_some(self.current)
    }

    pub fn to_first(&mut self, payload: &Payload) -> Option<usize> {
        self.current = 0;
        self.current(payload)
    }

    pub fn to_last(&mut self, payload: &Payload) -> Option<usize> {
        let count = self.count(payload);
        self.current = count.saturating_sub(1);
        self.current(payload)
    }

    /// Step forward, staying on the last field at the end.
    ///
    /// The first call after a reset only counts the fields and lands on
    /// field 0.
    pub fn advance(&mut self, payload: &Payload) -> Option<usize> {
        if self.field_count.is_some() {
            let last = self.count(payload).saturating_sub(1);
            self.current = (self.current + 1).min(last);
        } else {
            self.current = 0;
        }
        self.current(payload)
    }

    /// Step back, staying on field 0 at the start.
    ///
    /// Like [`advance`](Self::advance), the first call after a reset lands
    /// on field 0.
    pub fn retreat(&mut self, payload: &Payload) -> Option<usize> {
        if self.field_count.is_some() {
            self.current = self.current.saturating_sub(1);
        } else {
            self.current = 0;
        }
        self.current(payload)
    }

    fn count(&mut self, payload: &Payload) -> usize {
        *self.field_count.get_or_insert_with(|| payload.field_count())
    }
}

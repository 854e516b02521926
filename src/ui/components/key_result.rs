/// Outcome of offering a key event to a component.
///
/// Components return this so the parent view can chain handlers with
/// `or_else` and react to the events it cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}

//! Question observation: track the element under the pointer and extract
//! its displayed text on demand.

use serde::Deserialize;

/// A pointer/focus event, one JSON document per stdin line.
#[derive(Debug, Clone, Deserialize)]
pub struct PointerEvent {
    /// The element under the pointer; null when the pointer left every
    /// tracked element.
    #[serde(default)]
    pub target: Option<Target>,
}

/// The part of an on-screen element the observer cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    /// Rendered text, if the element has any.
    #[serde(default)]
    pub text: Option<String>,

    /// Input value. Kept loose: only string values count as text, anything
    /// else (numbers, arrays from exotic widgets) is ignored.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Tracks the most recent pointer target. No debouncing: the latest event
/// always wins.
#[derive(Debug, Default)]
pub struct QuestionObserver {
    last_target: Option<Target>,
}

impl QuestionObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        self.last_target = event.target;
    }

    /// Text of the last target, or empty when there is none.
    pub fn current_question(&self) -> String {
        extract_text(self.last_target.as_ref())
    }
}

/// Rendered text if present, else a string value, else empty. Never fails:
/// an absent element is just an empty question.
pub fn extract_text(target: Option<&Target>) -> String {
    let Some(target) = target else {
        return String::new();
    };

    if let Some(text) = &target.text {
        if !text.is_empty() {
            return text.clone();
        }
    }

    if let Some(serde_json::Value::String(value)) = &target.value {
        return value.clone();
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(raw: serde_json::Value) -> PointerEvent {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn no_target_yields_empty_question() {
        let observer = QuestionObserver::new();
        assert_eq!(observer.current_question(), "");
    }

    #[test]
    fn text_takes_priority_over_value() {
        let mut observer = QuestionObserver::new();
        observer.on_pointer_move(event(json!({
            "target": {"text": "what is 2+2", "value": "typed"}
        })));
        assert_eq!(observer.current_question(), "what is 2+2");
    }

    #[test]
    fn string_value_is_used_when_text_is_missing_or_empty() {
        let mut observer = QuestionObserver::new();
        observer.on_pointer_move(event(json!({
            "target": {"text": "", "value": "typed question"}
        })));
        assert_eq!(observer.current_question(), "typed question");

        observer.on_pointer_move(event(json!({
            "target": {"value": "another"}
        })));
        assert_eq!(observer.current_question(), "another");
    }

    #[test]
    fn non_string_value_is_ignored() {
        let mut observer = QuestionObserver::new();
        observer.on_pointer_move(event(json!({
            "target": {"value": 42}
        })));
        assert_eq!(observer.current_question(), "");
    }

    #[test]
    fn latest_event_wins() {
        let mut observer = QuestionObserver::new();
        observer.on_pointer_move(event(json!({"target": {"text": "first"}})));
        observer.on_pointer_move(event(json!({"target": {"text": "second"}})));
        assert_eq!(observer.current_question(), "second");

        // Pointer left every element: the question goes empty again.
        observer.on_pointer_move(event(json!({"target": null})));
        assert_eq!(observer.current_question(), "");
    }
}

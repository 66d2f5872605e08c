use fastdict_llm::{Content, ContentPart, Message};

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_from_string() {
    let content: Content = "Test".into();
    assert_eq!(content.as_text(), Some("Test"));
}

#[test]
fn test_content_parts_single() {
    let content = Content::Parts(vec![ContentPart::Text {
        text: "Hello".to_string(),
    }]);
    assert_eq!(content.as_text(), Some("Hello"));
}

#[test]
fn test_content_parts_multiple_is_not_plain_text() {
    let content = Content::Parts(vec![
        ContentPart::Text { text: "a".to_string() },
        ContentPart::Text { text: "b".to_string() },
    ]);
    assert_eq!(content.as_text(), None);
}

#[test]
fn test_message_roles() {
    assert_eq!(Message::system("You are a dictionary").role(), "system");
    assert_eq!(Message::human("Look up: cat").role(), "user");
    assert_eq!(Message::ai("猫").role(), "assistant");
}

#[test]
fn test_message_serialization_human() {
    let msg = Message::human("Look up: cat");
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("Look up: cat"));
    assert!(!json.contains("name"));
}

#[test]
fn test_message_deserialization() {
    let json = r#"{"role":"assistant","content":"字典"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.role(), "assistant");
    assert_eq!(msg.content().as_text(), Some("字典"));
}

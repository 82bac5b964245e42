//! Message model and the class-name driven extraction over a parsed export.
//!
//! A Qwen Chat export marks every turn with a container element whose class
//! list holds `qwen-chat-message-user` or `qwen-chat-message-assistant`. The
//! text lives in a nested content node; assistant turns also carry a header
//! with the reply time and the model name.

use crate::normalize::{normalize_element, stripped_text};
use scraper::{ElementRef, Html};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const USER_CONTAINER_CLASS: &str = "qwen-chat-message-user";
pub const ASSISTANT_CONTAINER_CLASS: &str = "qwen-chat-message-assistant";

const USER_CONTENT_CLASS: &str = "user-message-content";
const ASSISTANT_CONTENT_CLASS: &str = "response-message-content";
const ASSISTANT_TIME_CLASS: &str = "response-message-head-time";
const ASSISTANT_MODEL_CLASS: &str = "response-message-head-model";

/// Conversation turn role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted conversation turn.
///
/// `message_id` is the container's `id` attribute, empty when the export
/// has none. User turns never carry `timestamp` or `model`.
///
/// Serialized user turns have no `model` key at all; assistant turns always
/// have one, `null` when the header showed no model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub message_id: String,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let with_model = self.role == Role::Assistant;
        let mut state =
            serializer.serialize_struct("Message", if with_model { 5 } else { 4 })?;
        state.serialize_field("role", &self.role)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("message_id", &self.message_id)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        if with_model {
            state.serialize_field("model", &self.model)?;
        } else {
            state.skip_field("model")?;
        }
        state.end()
    }
}

/// Messages in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.count(Role::User)
    }

    pub fn assistant_count(&self) -> usize {
        self.count(Role::Assistant)
    }

    fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

/// Why a single container could not be turned into a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The first content node below the container belongs to a container
    /// nested inside it, so the turn's own text cannot be told apart.
    #[error("{role} container {id:?} has its content inside a nested message container")]
    NestedContainer { role: Role, id: String },
}

/// Parse decoded export markup and extract every message in document order.
pub fn parse_conversation(markup: &str) -> Conversation {
    let document = Html::parse_document(markup);
    extract_messages(&document)
}

/// Walk `document` in order, dispatching each message container to the
/// extractor for its role.
///
/// Containers are selected when any class token contains a role pattern,
/// but only dispatched when a token equals it. Containers without content,
/// and containers whose extraction fails, are skipped.
pub fn extract_messages(document: &Html) -> Conversation {
    let containers: Vec<ElementRef<'_>> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| {
            has_class_containing(*el, USER_CONTAINER_CLASS)
                || has_class_containing(*el, ASSISTANT_CONTAINER_CLASS)
        })
        .collect();

    info!(
        "Found {} user messages and {} assistant messages",
        containers
            .iter()
            .filter(|el| has_class_containing(**el, USER_CONTAINER_CLASS))
            .count(),
        containers
            .iter()
            .filter(|el| has_class_containing(**el, ASSISTANT_CONTAINER_CLASS))
            .count(),
    );

    let mut messages = Vec::new();
    for container in containers {
        let extracted = match container_role(container) {
            Some(Role::User) => extract_user_message(container),
            Some(Role::Assistant) => extract_assistant_message(container),
            None => continue,
        };
        match extracted {
            Ok(Some(message)) => messages.push(message),
            Ok(None) => debug!(
                "Skipped container {:?}: no content",
                container.value().id().unwrap_or_default()
            ),
            Err(e) => warn!("Error extracting message: {}", e),
        }
    }

    info!("Extracted {} messages", messages.len());
    Conversation { messages }
}

/// Extract a user turn. `Ok(None)` when the content node is absent or empty.
pub fn extract_user_message(container: ElementRef<'_>) -> Result<Option<Message>, ExtractError> {
    let Some(content) = find_content(container, Role::User, USER_CONTENT_CLASS)? else {
        return Ok(None);
    };

    Ok(Some(Message {
        role: Role::User,
        content,
        message_id: container_id(container),
        timestamp: None,
        model: None,
    }))
}

/// Extract an assistant turn along with its header time and model name.
pub fn extract_assistant_message(
    container: ElementRef<'_>,
) -> Result<Option<Message>, ExtractError> {
    let Some(content) = find_content(container, Role::Assistant, ASSISTANT_CONTENT_CLASS)? else {
        return Ok(None);
    };

    Ok(Some(Message {
        role: Role::Assistant,
        content,
        message_id: container_id(container),
        timestamp: header_field(container, ASSISTANT_TIME_CLASS),
        model: header_field(container, ASSISTANT_MODEL_CLASS),
    }))
}

fn find_content(
    container: ElementRef<'_>,
    role: Role,
    class: &str,
) -> Result<Option<String>, ExtractError> {
    let Some(node) = find_by_class(container, class) else {
        return Ok(None);
    };

    let nested = node
        .ancestors()
        .take_while(|a| a.id() != container.id())
        .filter_map(ElementRef::wrap)
        .any(|a| container_role(a).is_some());
    if nested {
        return Err(ExtractError::NestedContainer {
            role,
            id: container_id(container),
        });
    }

    let text = normalize_element(node);
    Ok((!text.is_empty()).then_some(text))
}

fn header_field(container: ElementRef<'_>, class: &str) -> Option<String> {
    find_by_class(container, class).map(stripped_text)
}

/// First descendant (excluding `root`) with a class token containing `needle`.
fn find_by_class<'a>(root: ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| has_class_containing(*el, needle))
}

fn has_class_containing(element: ElementRef<'_>, needle: &str) -> bool {
    element.value().classes().any(|c| c.contains(needle))
}

fn container_role(element: ElementRef<'_>) -> Option<Role> {
    let value = element.value();
    if value.classes().any(|c| c == USER_CONTAINER_CLASS) {
        Some(Role::User)
    } else if value.classes().any(|c| c == ASSISTANT_CONTAINER_CLASS) {
        Some(Role::Assistant)
    } else {
        None
    }
}

fn container_id(container: ElementRef<'_>) -> String {
    container.value().id().unwrap_or_default().to_string()
}

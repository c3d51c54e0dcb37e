use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Portlet id persisted for actions that cover every portlet of a document
pub const ALL_PORTLETS: i32 = -1;

/// Kind of content mutation recorded in the action queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum TaskType {
    Create,
    Modify,
    Delete,
}

impl TaskType {
    /// Integer encoding used by the persisted action log
    pub fn task_id(self) -> u8 {
        match self {
            TaskType::Create => 1,
            TaskType::Modify => 2,
            TaskType::Delete => 3,
        }
    }

    pub fn from_task_id(task_id: u8) -> Option<Self> {
        match task_id {
            1 => Some(TaskType::Create),
            2 => Some(TaskType::Modify),
            3 => Some(TaskType::Delete),
            _ => None,
        }
    }
}

/// Portlet scope of an action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum PortletScope {
    /// Every portlet and every scope the document appears in
    #[default]
    All,
    /// A single portlet
    Portlet(i32),
}

impl From<i32> for PortletScope {
    fn from(value: i32) -> Self {
        if value == ALL_PORTLETS {
            PortletScope::All
        } else {
            PortletScope::Portlet(value)
        }
    }
}

impl From<PortletScope> for i32 {
    fn from(scope: PortletScope) -> Self {
        match scope {
            PortletScope::All => ALL_PORTLETS,
            PortletScope::Portlet(id) => id,
        }
    }
}

impl std::fmt::Display for PortletScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortletScope::All => write!(f, "all"),
            PortletScope::Portlet(id) => write!(f, "{}", id),
        }
    }
}

/// Value of the `document_portlet_id` engine field for a document shown in a portlet
pub fn document_portlet_id(document_id: &str, portlet_id: i32) -> String {
    format!("{}&{}", document_id, portlet_id)
}

/// A pending content mutation awaiting application to the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerAction {
    /// Monotonic queue position
    pub id: u64,
    pub document_id: String,
    pub task: TaskType,
    /// Routes the action to the indexer claiming this resource type
    pub resource_type: String,
    #[serde(default)]
    pub portlet: PortletScope,
}

impl IndexerAction {
    /// Whether a document materialized for this action falls inside its portlet scope
    pub fn covers(&self, document_portlet: Option<&str>) -> bool {
        match self.portlet {
            PortletScope::All => true,
            PortletScope::Portlet(portlet_id) => {
                document_portlet == Some(document_portlet_id(&self.document_id, portlet_id).as_str())
            }
        }
    }
}

/// Content change notification emitted by a producer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContentChange {
    #[validate(length(min = 1, max = 255))]
    pub document_id: String,
    pub task: TaskType,
    #[validate(length(min = 1, max = 255))]
    pub resource_type: String,
    #[serde(default)]
    pub portlet: PortletScope,
}

impl ContentChange {
    pub fn new(document_id: impl Into<String>, task: TaskType, resource_type: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            task,
            resource_type: resource_type.into(),
            portlet: PortletScope::All,
        }
    }

    pub fn in_portlet(mut self, portlet_id: i32) -> Self {
        self.portlet = PortletScope::from(portlet_id);
        self
    }
}

/// Persisted shape of an action: `(id, documentId, taskId, resourceType, portletId)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: u64,
    pub document_id: String,
    pub task_id: u8,
    pub resource_type: String,
    pub portlet_id: i32,
}

impl From<&IndexerAction> for ActionRecord {
    fn from(action: &IndexerAction) -> Self {
        Self {
            id: action.id,
            document_id: action.document_id.clone(),
            task_id: action.task.task_id(),
            resource_type: action.resource_type.clone(),
            portlet_id: action.portlet.into(),
        }
    }
}

impl TryFrom<ActionRecord> for IndexerAction {
    type Error = String;

    fn try_from(record: ActionRecord) -> Result<Self, Self::Error> {
        let task = TaskType::from_task_id(record.task_id)
            .ok_or_else(|| format!("unknown task id {} for action {}", record.task_id, record.id))?;
        Ok(Self {
            id: record.id,
            document_id: record.document_id,
            task,
            resource_type: record.resource_type,
            portlet: PortletScope::from(record.portlet_id),
        })
    }
}

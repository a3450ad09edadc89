use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{non_blank, Priority, ProfileSummary};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub priority: Priority,
    pub requester_id: String,
    pub assignee_id: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn from_request(req: &CreateTicketRequest, requester_id: &str) -> Result<Self, &'static str> {
        let subject = non_blank(req.subject.as_deref()).ok_or("subject is required")?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            subject,
            description: non_blank(req.description.as_deref()),
            status: TicketStatus::Open,
            priority: req.priority.unwrap_or_default(),
            requester_id: requester_id.to_string(),
            assignee_id: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a triage update; resolving stamps `resolved_at`, reopening clears it
    pub fn apply(&mut self, changes: &UpdateTicketRequest) {
        let now = Utc::now();
        if let Some(status) = changes.status {
            if status.is_closed() && !self.status.is_closed() {
                self.resolved_at = Some(now);
            } else if !status.is_closed() {
                self.resolved_at = None;
            }
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(assignee_id) = changes.assignee_id.as_deref() {
            self.assignee_id = non_blank(Some(assignee_id));
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: String,
    pub ticket_id: String,
    pub author_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl TicketMessage {
    pub fn new(ticket_id: &str, author_id: &str, body: Option<&str>) -> Result<Self, &'static str> {
        let body = non_blank(body).ok_or("body is required")?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            ticket_id: ticket_id.to_string(),
            author_id: Some(author_id.to_string()),
            body,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub requester: Option<ProfileSummary>,
    pub assignee: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketMessageView {
    #[serde(flatten)]
    pub message: TicketMessage,
    pub author: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketView,
    pub messages: Vec<TicketMessageView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketMessageRequest {
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_ticket() -> Ticket {
        let request = CreateTicketRequest {
            subject: Some("Payslip missing".to_string()),
            description: None,
            priority: None,
        };
        Ticket::from_request(&request, "requester").unwrap()
    }

    fn set_status(ticket: &mut Ticket, status: TicketStatus) {
        ticket.apply(&UpdateTicketRequest {
            status: Some(status),
            ..Default::default()
        });
    }

    #[test]
    fn test_resolution_stamps() {
        let mut ticket = open_ticket();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, Priority::Medium);

        set_status(&mut ticket, TicketStatus::Resolved);
        let resolved_at = ticket.resolved_at.expect("resolved ticket is stamped");

        // resolved -> closed keeps the first resolution time
        set_status(&mut ticket, TicketStatus::Closed);
        assert_eq!(ticket.resolved_at, Some(resolved_at));

        set_status(&mut ticket, TicketStatus::InProgress);
        assert_eq!(ticket.resolved_at, None);
    }

    #[test]
    fn test_subject_and_body_required() {
        let request = CreateTicketRequest {
            subject: Some(" ".to_string()),
            description: None,
            priority: Some(Priority::Urgent),
        };
        assert!(Ticket::from_request(&request, "r").is_err());
        assert!(TicketMessage::new("t", "a", None).is_err());
        assert_eq!(TicketMessage::new("t", "a", Some(" hi ")).unwrap().body, "hi");
    }
}

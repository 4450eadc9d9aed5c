//! Vendors and customers share one contact shape; each lives at its own
//! resource path.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::{Entity, Resource};
use crate::draft::DraftParty;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Contact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A persisted record that can stand on the other side of an order.
pub trait PartyRecord: Resource {
    fn from_draft(draft: &DraftParty) -> Self;
    fn contact(&self) -> &Contact;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub contact: Contact,
}

impl Entity for Vendor {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Vendor {
    const PATH: &'static str = "vendors";
}

impl PartyRecord for Vendor {
    fn from_draft(draft: &DraftParty) -> Self {
        Self {
            id: draft.id.clone(),
            contact: draft.contact.clone(),
        }
    }

    fn contact(&self) -> &Contact {
        &self.contact
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub contact: Contact,
}

impl Entity for Customer {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Customer {
    const PATH: &'static str = "customers";
}

impl PartyRecord for Customer {
    fn from_draft(draft: &DraftParty) -> Self {
        Self {
            id: draft.id.clone(),
            contact: draft.contact.clone(),
        }
    }

    fn contact(&self) -> &Contact {
        &self.contact
    }
}

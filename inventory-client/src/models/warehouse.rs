use serde::{Deserialize, Serialize};

use crate::api::{Entity, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Entity for Warehouse {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Warehouse {
    const PATH: &'static str = "warehouses";
}

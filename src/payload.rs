use serde::Serialize;
use uuid::Uuid;

/// JSON body sent to the write endpoint.
///
/// Every payload carries a freshly generated email so repeated runs never
/// trip a uniqueness constraint on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub email: String,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub password: &'static str,
}

impl UserPayload {
    pub fn generate() -> Self {
        Self {
            email: format!("user-{}@test.com", Uuid::new_v4()),
            first_name: "Benchmark",
            last_name: "User",
            password: "test123",
        }
    }
}

/// One unit of work: a single POST, identified by its ordinal.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: usize,
    pub payload: UserPayload,
}

impl Task {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            payload: UserPayload::generate(),
        }
    }
}

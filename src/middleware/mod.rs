mod identity;
mod request_id;

pub use identity::UserIdentity;
pub use request_id::request_id_middleware;

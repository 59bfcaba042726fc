pub mod config;
pub mod error;
pub mod module;
pub mod object_id;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use module::Module;
pub use object_id::{InvalidObjectId, ObjectId};

/**
Swift-style object storage client.

Containers hold objects; objects carry content plus metadata. The
[`store::ObjectStore`] is the account-level entry point, usually built
from an authenticated identity. Container access control is expressed
through the [`acl`] rule engine, and uploads stream through the
transport layer with an end-to-end MD5 integrity check.
*/
pub mod acl;
pub mod container;
pub mod error;
pub mod info;
pub mod remote;
pub mod store;

mod headers;

pub use container::{Container, ContainerRecord, ObjectEntry};
pub use error::ObjectStoreError;
pub use info::{ObjectInfo, ObjectRecord};
pub use remote::RemoteObject;
pub use store::{AccountInfo, ObjectStore, SERVICE_TYPE};

pub mod prelude {
    pub use crate::acl::{Acl, Grant, Rule, READ, READ_WRITE, WRITE};
    pub use crate::container::{Container, ObjectEntry};
    pub use crate::error::ObjectStoreError;
    pub use crate::info::ObjectInfo;
    pub use crate::remote::RemoteObject;
    pub use crate::store::{AccountInfo, ObjectStore};
    pub use transport::UploadBody;
}
